//! Tests for the AWS v2 DynamoDB metastore implementation
//!
//! These tests validate the DynamoDB metastore implementation using mocks.

// Import the test modules
pub mod dynamodb_test;

// Import dependencies from parent modules
use crate::error::Result;
