pub mod collaborators;
pub mod completion;
pub mod dispatcher;
pub mod domains;
pub mod handlers;
pub mod llm_collaborators;
pub mod phrases;
pub mod prompts;
pub mod schema;
pub mod service;
pub mod session;
pub mod store;
pub mod summary;

#[cfg(test)]
pub mod testing;
