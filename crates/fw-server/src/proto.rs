//! Generated from `proto/filewhisperer.proto` by `tonic-build` at compile time.
#![allow(clippy::all)]

tonic::include_proto!("filewhisperer");
