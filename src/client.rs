//! Caching client for the rating API
//!
//! [`RatingClient`] exposes one method per read-only API operation. Every
//! call goes through the same path: build the cache key, consult the enabled
//! cache backends, fetch on a miss, store the response in every backend.

use serde_json::Value;
use tracing::debug;

use crate::api::{season_id, ApiId, Endpoint, LAST};
use crate::cache::{CacheBackend, CacheSet, FileCache, RedisCache};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::Fetcher;

/// Untyped API response, exactly as the server sent it
pub type ApiResponse = Value;

/// Read-only rating API client with optional Redis and file caching
#[derive(Debug)]
pub struct RatingClient {
    fetcher: Fetcher,
    cache: CacheSet,
}

impl Default for RatingClient {
    fn default() -> Self {
        Self::with_backends(Fetcher::default(), CacheSet::disabled())
    }
}

impl RatingClient {
    /// Creates a client from configuration
    ///
    /// Connects to Redis right away when the memory service is configured;
    /// an unreachable server fails construction. Redis is consulted before
    /// the file cache.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut cache = CacheSet::disabled();

        if let Some(memory) = &config.memory_service {
            let redis =
                RedisCache::connect_with_prefix(&memory.host, memory.port, &memory.key_prefix)?;
            cache.push(Box::new(redis));
        }

        if config.file_cache {
            cache.push(Box::new(FileCache::with_dir(&config.cache_dir)));
        }

        debug!(
            "Rating client for {} with cache {:?}",
            config.base_url,
            cache.names()
        );
        Ok(Self::with_backends(Fetcher::new(config.base_url), cache))
    }

    /// Creates a client from an explicit fetcher and backend set
    pub fn with_backends(fetcher: Fetcher, cache: CacheSet) -> Self {
        Self { fetcher, cache }
    }

    /// Adds a backend after the existing ones in read order
    pub fn push_backend(&mut self, backend: Box<dyn CacheBackend>) {
        self.cache.push(backend);
    }

    /// The fetcher used on cache misses
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Runs any endpoint from the table
    ///
    /// A cache hit is returned as stored, without checking the live API.
    pub fn query(&mut self, endpoint: Endpoint, args: &[ApiId]) -> Result<ApiResponse> {
        let key = endpoint.cache_key(args)?;
        let path = endpoint.path(args)?;

        if let Some(cached) = self.cache.get(&key)? {
            return Ok(cached);
        }

        debug!("No cache for {}", key);
        let response = self.fetcher.fetch(&path, &[])?;
        self.cache.set(&key, &response)?;
        Ok(response)
    }

    /// Removes cached entries; `None` clears everything, `Some(mask)` only
    /// keys matching the glob (e.g. `*rosters*`)
    pub fn clear_cache(&mut self, mask: Option<&str>) -> Result<()> {
        self.cache.clear(mask)?;
        Ok(())
    }

    /// Drops the cached response for one call so the next one refetches
    pub fn invalidate(&mut self, endpoint: Endpoint, args: &[ApiId]) -> Result<()> {
        let key = endpoint.cache_key(args)?;
        self.cache.delete(&key)?;
        Ok(())
    }

    /// Runs an endpoint the way its dedicated method does, unwrapping the
    /// one-element list single-object endpoints answer with
    pub fn call(&mut self, endpoint: Endpoint, args: &[ApiId]) -> Result<ApiResponse> {
        let response = self.query(endpoint, args)?;
        if endpoint.is_single_object() {
            Ok(first_element(response))
        } else {
            Ok(response)
        }
    }

    fn query_single(&mut self, endpoint: Endpoint, id: ApiId) -> Result<ApiResponse> {
        self.call(endpoint, &[id])
    }

    fn query_one(&mut self, endpoint: Endpoint, id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query(endpoint, &[id.into()])
    }

    fn query_two(
        &mut self,
        endpoint: Endpoint,
        first: impl Into<ApiId>,
        second: impl Into<ApiId>,
    ) -> Result<ApiResponse> {
        self.query(endpoint, &[first.into(), second.into()])
    }

    /// Player profile
    pub fn player(&mut self, player_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_single(Endpoint::Player, player_id.into())
    }

    /// All rating releases for a player
    pub fn player_ratings(&mut self, player_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::PlayerRatings, player_id)
    }

    /// Player rating in one release, or the latest one
    pub fn player_rating(
        &mut self,
        player_id: impl Into<ApiId>,
        release_id: Option<i64>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::PlayerRating, player_id, or_last(release_id))
    }

    /// Teams the player has played for
    pub fn player_teams(&mut self, player_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::PlayerTeams, player_id)
    }

    /// Every tournament the player has played
    pub fn player_all_tournaments(&mut self, player_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::PlayerAllTournaments, player_id)
    }

    /// Tournaments the player played in one season (by year), or the last one
    pub fn player_tournaments(
        &mut self,
        player_id: impl Into<ApiId>,
        season: Option<i32>,
    ) -> Result<ApiResponse> {
        let season = season_arg(season)?;
        self.query_two(Endpoint::PlayerTournaments, player_id, season)
    }

    /// Team profile
    pub fn team(&mut self, team_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_single(Endpoint::Team, team_id.into())
    }

    /// All rating releases for a team
    pub fn team_ratings(&mut self, team_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TeamRatings, team_id)
    }

    /// Team rating in one release, or the latest one
    pub fn team_rating(
        &mut self,
        team_id: impl Into<ApiId>,
        release_id: Option<i64>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::TeamRating, team_id, or_last(release_id))
    }

    /// Base rosters of a team across all seasons
    pub fn team_rosters(&mut self, team_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TeamRosters, team_id)
    }

    /// Base roster of a team in one season (by year), or the last one
    pub fn team_roster(
        &mut self,
        team_id: impl Into<ApiId>,
        season: Option<i32>,
    ) -> Result<ApiResponse> {
        let season = season_arg(season)?;
        self.query_two(Endpoint::TeamRoster, team_id, season)
    }

    /// Every tournament the team has played
    pub fn team_all_tournaments(&mut self, team_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TeamAllTournaments, team_id)
    }

    /// Tournaments the team played in one season (by year), or the last one
    pub fn team_tournaments(
        &mut self,
        team_id: impl Into<ApiId>,
        season: Option<i32>,
    ) -> Result<ApiResponse> {
        let season = season_arg(season)?;
        self.query_two(Endpoint::TeamTournaments, team_id, season)
    }

    /// Tournament details
    pub fn tournament(&mut self, tournament_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_single(Endpoint::Tournament, tournament_id.into())
    }

    /// Full results table
    pub fn tournament_results(&mut self, tournament_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TournamentResults, tournament_id)
    }

    /// Results of teams from one town
    pub fn tournament_results_town(
        &mut self,
        tournament_id: impl Into<ApiId>,
        town_id: impl Into<ApiId>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::TournamentResultsTown, tournament_id, town_id)
    }

    /// Results of teams from one region
    pub fn tournament_results_region(
        &mut self,
        tournament_id: impl Into<ApiId>,
        region_id: impl Into<ApiId>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::TournamentResultsRegion, tournament_id, region_id)
    }

    /// Results of teams from one country
    pub fn tournament_results_country(
        &mut self,
        tournament_id: impl Into<ApiId>,
        country_id: impl Into<ApiId>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::TournamentResultsCountry, tournament_id, country_id)
    }

    /// Rosters of every team that played the tournament
    pub fn tournament_rosters(&mut self, tournament_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TournamentRosters, tournament_id)
    }

    /// Roster of one team at the tournament
    pub fn tournament_roster(
        &mut self,
        tournament_id: impl Into<ApiId>,
        team_id: impl Into<ApiId>,
    ) -> Result<ApiResponse> {
        self.query_two(Endpoint::TournamentRoster, tournament_id, team_id)
    }

    /// Disputed answers
    pub fn tournament_answers(&mut self, tournament_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TournamentAnswers, tournament_id)
    }

    /// Appeals
    pub fn tournament_appeals(&mut self, tournament_id: impl Into<ApiId>) -> Result<ApiResponse> {
        self.query_one(Endpoint::TournamentAppeals, tournament_id)
    }
}

/// Single-object endpoints answer with a one-element list; unwrap it.
/// An empty list yields `null`, anything else passes through untouched.
fn first_element(response: Value) -> Value {
    match response {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn or_last(id: Option<i64>) -> ApiId {
    id.map(ApiId::Int).unwrap_or_else(|| ApiId::from(LAST))
}

fn season_arg(year: Option<i32>) -> Result<ApiId> {
    match year {
        Some(year) => Ok(ApiId::from(season_id(year)?)),
        None => Ok(ApiId::from(LAST)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RatingError;
    use serde_json::json;

    #[test]
    fn test_first_element_unwraps_list() {
        let response = json!([{"idplayer": "42", "surname": "Иванов"}]);
        assert_eq!(
            first_element(response),
            json!({"idplayer": "42", "surname": "Иванов"})
        );
    }

    #[test]
    fn test_first_element_of_empty_list_is_null() {
        assert_eq!(first_element(json!([])), Value::Null);
    }

    #[test]
    fn test_first_element_passes_objects_through() {
        let response = json!({"error": "not found"});
        assert_eq!(first_element(response.clone()), response);
    }

    #[test]
    fn test_missing_release_means_last() {
        assert_eq!(or_last(None), ApiId::Str("last".to_string()));
        assert_eq!(or_last(Some(1400)), ApiId::Int(1400));
    }

    #[test]
    fn test_season_year_is_translated() {
        assert_eq!(season_arg(Some(2018)).unwrap(), ApiId::Int(52));
        assert_eq!(season_arg(None).unwrap(), ApiId::Str("last".to_string()));
    }

    #[test]
    fn test_unknown_season_fails_before_fetching() {
        // Base URL is unroutable; reaching the network would produce a fetch error
        let mut client = RatingClient::with_backends(
            Fetcher::new("http://127.0.0.1:1/api"),
            CacheSet::disabled(),
        );
        let err = client.team_roster(1, Some(1999)).unwrap_err();
        assert!(matches!(err, RatingError::UnknownSeason { year: 1999, .. }));
    }

    #[test]
    fn test_query_with_wrong_arity_fails() {
        let mut client = RatingClient::default();
        let err = client
            .query(Endpoint::TournamentRoster, &[ApiId::from(5773)])
            .unwrap_err();
        assert!(matches!(err, RatingError::Arity { .. }));
    }
}
