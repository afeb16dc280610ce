pub mod buffer_pool;
pub mod catalog;
pub mod database;
pub mod error;
pub mod field;
pub mod heap_file;
pub mod heap_page;
pub mod histogram;
pub mod ids;
pub mod lock_manager;
pub mod operator;
pub mod permission;
pub mod predicate;
pub mod rwlock;
pub mod transaction;
pub mod tuple;

use std::io::Write;

use env_logger::Builder;

/// Installs a logger that prefixes each line with level, target, and
/// source location. Safe to call more than once (e.g. from several test
/// modules); only the first call takes effect.
pub fn init_log() {
    let mut builder = Builder::from_default_env();
    let _ = builder
        .format_timestamp_secs()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} - {}] [{}:{}] {}",
                record.level(),
                record.target(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .is_test(true)
        .try_init();
}
