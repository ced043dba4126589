//! Account creation flows for artists and administrators.

use crate::wizard::{FieldDescriptor, FieldKind, StepDescriptor, WizardDescriptor};

use super::music_registration::GENRES;

pub const ARTIST_NAME: &str = "artist-signup";
pub const ADMIN_NAME: &str = "admin-signup";

pub const ACCOUNT_TYPES: [&str; 3] = ["Artist", "Composer", "Publisher"];
pub const DEPARTMENTS: [&str; 4] = ["Rights Management", "Finance", "Operations", "IT"];

pub const MIN_PASSWORD_LEN: usize = 8;

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|option| option.to_string()).collect()
}

fn account_step() -> StepDescriptor {
    StepDescriptor::new(
        "Account",
        vec![
            FieldDescriptor::text("fullName", "Full Name").required("Full name is required"),
            FieldDescriptor::text("email", "Email")
                .required("Email is required")
                .email("Please enter a valid email address")
                .with_realtime(),
            FieldDescriptor::text("password", "Password")
                .required("Password is required")
                .min_length(MIN_PASSWORD_LEN, "Password must be at least 8 characters")
                .with_realtime(),
            FieldDescriptor::text("confirmPassword", "Confirm Password")
                .required("Please confirm your password")
                .matches("password", "Passwords do not match")
                .with_realtime(),
        ],
    )
}

pub fn artist_descriptor() -> WizardDescriptor {
    let profile = StepDescriptor::new(
        "Profile",
        vec![
            FieldDescriptor::new("accountType", "Account Type", FieldKind::Choice(owned(&ACCOUNT_TYPES)))
                .required("Select an account type")
                .one_of("Account type must be artist, composer, or publisher"),
            FieldDescriptor::new("genres", "Genres", FieldKind::MultiSelect(owned(&GENRES)))
                .required("Select at least one genre")
                .with_help("Toggle every genre you perform or publish in."),
            FieldDescriptor::text("phone", "Phone")
                .phone("Please enter a valid phone number")
                .with_realtime(),
        ],
    );
    WizardDescriptor::new(ARTIST_NAME, "Create an account", vec![account_step(), profile])
        .with_redirect("/dashboard")
}

/// Admin sign-up; `admin_code` is the registration code applicants must know.
pub fn admin_descriptor(admin_code: &str) -> WizardDescriptor {
    let access = StepDescriptor::new(
        "Access",
        vec![
            FieldDescriptor::new("department", "Department", FieldKind::Choice(owned(&DEPARTMENTS)))
                .required("Department is required")
                .one_of("Select a department from the list"),
            FieldDescriptor::text("adminCode", "Admin Registration Code")
                .required("Admin registration code is required")
                .equals(admin_code, "Invalid admin registration code")
                .with_realtime(),
        ],
    );
    WizardDescriptor::new(ADMIN_NAME, "Create an admin account", vec![account_step(), access])
        .with_redirect("/admin/dashboard")
}
