//! Typed endpoint helpers.

use reqwest::Method;

use crate::dispatch::Dispatcher;
use crate::error::DispatchResult;
use crate::http::{RequestOptions, ResponseBody, Transport};
use crate::routing::Route;

/// Route for a guild member search.
pub fn guild_members_search_route(guild_id: u64, query: &str, limit: u32) -> DispatchResult<Route> {
    Ok(Route::new(
        Method::GET,
        "/guilds/{guild_id}/members/search?query={query}&limit={limit}",
        [
            ("guild_id", guild_id.to_string()),
            ("query", query.to_string()),
            ("limit", limit.to_string()),
        ],
    )?)
}

impl<T: Transport> Dispatcher<T> {
    /// Search a guild's members by name prefix.
    pub async fn request_guild_members(
        &self,
        guild_id: u64,
        query: &str,
        limit: u32,
    ) -> DispatchResult<ResponseBody> {
        let route = guild_members_search_route(guild_id, query, limit)?;
        self.request(&route, RequestOptions::new()).await
    }

    /// The account the token belongs to.
    pub async fn get_current_user(&self) -> DispatchResult<ResponseBody> {
        let route = Route::fixed(Method::GET, "/users/@me")?;
        self.request(&route, RequestOptions::new()).await
    }
}
