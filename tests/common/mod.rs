pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once per test binary.
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
