//! Member music registration: personal details, then one or more songs.

use crate::wizard::{FieldDescriptor, FieldKind, RecordSchema, StepDescriptor, WizardDescriptor};

pub const NAME: &str = "music-registration";

pub const GENRES: [&str; 10] = [
    "Afro Pop",
    "Traditional",
    "Jazz",
    "Hip Hop",
    "R&B",
    "Gospel",
    "Rock",
    "Electronic",
    "Classical",
    "Other",
];

pub fn descriptor() -> WizardDescriptor {
    WizardDescriptor::new(
        NAME,
        "Music Registration",
        vec![personal_step(), songs_step()],
    )
    .with_redirect("/dashboard")
}

fn personal_step() -> StepDescriptor {
    StepDescriptor::new(
        "Personal Information",
        vec![
            FieldDescriptor::text("fullName", "Full Name")
                .required("Full name is required")
                .min_length(3, "Name must be at least 3 characters")
                .with_realtime(),
            FieldDescriptor::text("stageName", "Stage Name"),
            FieldDescriptor::text("address", "Address")
                .required("Address is required")
                .min_length(10, "Please provide a complete address"),
            FieldDescriptor::new("idDocument", "ID Document (PDF or Image)", FieldKind::File)
                .required("ID document is required")
                .with_help("Accepted formats: .pdf, .jpg, .jpeg, .png"),
            FieldDescriptor::text("email", "Email")
                .email("Please enter a valid email address")
                .with_realtime(),
            FieldDescriptor::text("phone", "Phone")
                .phone("Please enter a valid phone number")
                .with_realtime(),
        ],
    )
}

fn songs_step() -> StepDescriptor {
    let genres = GENRES.iter().map(|genre| genre.to_string()).collect();
    let song = RecordSchema::new(
        "Song",
        vec![
            FieldDescriptor::text("title", "Song Title")
                .required("Title is required")
                .min_length(2, "Title is too short"),
            FieldDescriptor::new("genre", "Genre", FieldKind::Choice(genres))
                .required("Genre is required")
                .one_of("Select a genre from the list"),
            FieldDescriptor::text("composer", "Composer")
                .required("Composer name is required")
                .min_length(3, "Composer name is too short"),
            FieldDescriptor::text("description", "Description"),
        ],
    )
    .with_file("Audio File");

    StepDescriptor::new(
        "Song Registration",
        vec![FieldDescriptor::new("songs", "Songs", FieldKind::Records(song))],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_two_steps_with_song_list() {
        let descriptor = descriptor();
        assert_eq!(descriptor.total_steps(), 2);
        let songs = descriptor.field("songs").and_then(|f| f.record_schema()).unwrap();
        let keys: Vec<_> = songs.keys().collect();
        assert_eq!(keys, vec!["title", "genre", "composer", "description"]);
        assert_eq!(songs.file_label, Some("Audio File"));
    }

    #[test]
    fn realtime_fields_match_format_rules() {
        let descriptor = descriptor();
        let realtime: Vec<_> = descriptor
            .fields()
            .filter(|field| field.realtime)
            .map(|field| field.key)
            .collect();
        assert_eq!(realtime, vec!["fullName", "email", "phone"]);
    }
}
