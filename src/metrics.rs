//! Prometheus metrics registered in the default registry

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Error responses returned by the API, labelled by kind
    pub static ref API_ERRORS: IntCounterVec = register_int_counter_vec!(
        "api_errors_total",
        "Error responses returned by the API",
        &["kind"]
    )
    .unwrap();

    /// Store mutations performed by the services, labelled by table and verb
    pub static ref STORE_WRITES: IntCounterVec = register_int_counter_vec!(
        "store_writes_total",
        "Insert, update and delete calls issued to the store",
        &["table", "verb"]
    )
    .unwrap();
}

/// Record a store mutation
pub fn record_write(table: &str, verb: &str) {
    STORE_WRITES.with_label_values(&[table, verb]).inc();
}
