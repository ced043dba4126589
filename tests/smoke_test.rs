use registration_core::{config::WizardConfig, forms::FormKind, init};

#[test]
fn every_form_builds_a_wizard() {
    init();

    let config = WizardConfig::default();
    for kind in FormKind::ALL {
        let wizard = kind.wizard(&config);
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.total_steps(), 2);
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.descriptor().name, kind.name());
    }
}
