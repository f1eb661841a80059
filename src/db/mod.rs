//! MongoDB persistence layer
//!
//! Client/collection plumbing plus the document schemas for challenges,
//! memberships, and activity records.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
