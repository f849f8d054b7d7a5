//! Shared bootstrap for test binaries across the workspace.

use ctor::ctor;

#[ctor]
fn init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}
