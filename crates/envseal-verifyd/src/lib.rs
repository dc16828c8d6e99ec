//! envseal Verification Service Library
//!
//! Key-less HTTP front end for the digest ledger:
//! - `GET /` serves an upload form
//! - `POST /checksum` re-digests an uploaded payload and compares it with
//!   the digest recorded under the submitted id

pub mod pages;
pub mod routes;
