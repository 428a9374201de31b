#![forbid(unsafe_code)]

mod schema;

pub(super) use schema::migrate_sqlite_schema;
