//! Integration-test crate (spec §8 "Testable properties" + SPEC_FULL §2
//! ambient test tooling). Kept in the teacher's layout: one `#[cfg(test)]
//! mod` per area under `tests/src/`, wired together from this root so the
//! whole crate builds as a single library with `cargo test -p tests`.

mod binlog {
    pub mod test_5_7;
    pub mod test_8_0;
    pub mod util_test;

    pub mod decoder {
        pub mod binlog_reader_wrapper_test;
        pub mod bytes_binlog_reader_test;
        pub mod file_binlog_reader_test;
    }

    pub mod events {
        pub mod event_factory_test;
        pub mod event_raw_test;
    }

    pub mod factory {
        pub mod event_factory_test;
        pub mod test_iter_owener;
        pub mod test_iter_ref;
    }
}

mod test_normal;
mod test_5_7;
mod test_8_0;
mod test_stop;

mod agent {
    pub mod action_serialization_test;
}
