//! Integration tests for gftp-drive
//!
//! Uses wiremock to simulate the Drive v3 API and Google's token endpoint,
//! and verifies end-to-end behavior of listing, uploads, downloads,
//! deletion and credential renewal.

mod common;

mod test_auth;
mod test_delete;
mod test_list;
mod test_transfers;
