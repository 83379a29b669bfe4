//! Generated gRPC message and client types for the inference contract.
//!
//! Compiled at build time from `proto/inference.proto` by `tonic-build`; see
//! `build.rs`.

#![allow(missing_docs, reason = "tonic-build generates undocumented types")]
#![expect(clippy::missing_const_for_fn, reason = "generated code")]

tonic::include_proto!("inference");
