//! Subscriber ownership
//!
//! Runs in its own test binary so no other test has touched the global
//! subscriber.

use vscreen::*;

#[test]
fn test_entry_point_leaves_subscriber_to_the_application() {
    let config = GlobalConfig {
        debug_logging: true,
        ..Default::default()
    };
    let vscreen = VScreen::init_with(config).unwrap();

    // the first install wins, so this only succeeds if init_with installed nothing
    assert!(init_tracing(vscreen.config()));
    assert!(!init_tracing(vscreen.config()));
}
