//! Published content: issues and the articles in them.

pub mod article;
pub mod issue;
