pub mod form;
pub mod submit;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in system::definitions()
        .into_iter()
        .chain(form::definitions())
        .chain(submit::definitions())
    {
        registry.register(entry);
    }
}
