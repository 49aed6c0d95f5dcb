pub mod gitlab;
pub mod jira;
pub mod local_git;
