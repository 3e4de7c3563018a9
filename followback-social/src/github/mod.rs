//! GitHub REST API integration: paginated follower/following reads and
//! follow/unfollow mutations on behalf of the token's owner.
pub mod client;
pub mod types;

pub use client::{GithubApi, is_valid_login};
pub use types::GithubUser;
