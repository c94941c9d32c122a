//! GraphQL client for Subsquid-style governance indexers.
//!
//! One endpoint per network, built from a URL template in which
//! `{network}` is replaced by the network name.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use votepower_core::{RawDelegation, TrackId};

use super::traits::*;

/// Proposal states counted as active on a track.
const ACTIVE_PROPOSAL_STATES: &[&str] = &[
    "DecisionDepositPlaced",
    "Submitted",
    "Deciding",
    "ConfirmStarted",
    "ConfirmAborted",
];

const TRACK_DELEGATIONS_QUERY: &str = r#"
query ActiveDelegationsToOrFromAddressForTrack($track_eq: Int!, $address: [String!], $active_states: [ProposalStatus!]) {
  votingDelegations(
    orderBy: createdAt_ASC
    where: {track_eq: $track_eq, endedAtBlock_isNull: true, type_eq: OpenGov, AND: {OR: [{from_in: $address}, {to_in: $address}]}}
  ) {
    from
    to
    balance
    lockPeriod
  }
  proposalsConnection(orderBy: id_ASC, where: {trackNumber_eq: $track_eq, status_in: $active_states}) {
    totalCount
  }
}
"#;

const ALL_TRACK_DELEGATIONS_QUERY: &str = r#"
query TrackLevelDelegations($track_num: Int!) {
  votingDelegations(where: {endedAtBlock_isNull: true, type_eq: OpenGov, track_eq: $track_num}) {
    from
    to
    balance
    lockPeriod
  }
}
"#;

/// Subsquid GraphQL client.
pub struct SubsquidClient {
    client: Client,
    url_template: String,
    api_key: Option<String>,
}

impl SubsquidClient {
    /// Create a client. `url_template` may contain `{network}`.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url_template: url_template.into(),
            api_key: None,
        }
    }

    /// Use the public hosted squids.
    pub fn hosted() -> Self {
        Self::new("https://squid.subsquid.io/{network}-polkassembly/graphql")
    }

    /// Send an API key with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self, network: &str) -> String {
        self.url_template.replace("{network}", network)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        network: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, QueryError> {
        let body = GraphQlRequest { query, variables };

        let mut request = self.client.post(self.endpoint(network));
        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(QueryError::RateLimited { retry_after_ms: None });
            }

            return Err(QueryError::RequestFailed(format!("HTTP {}: {}", status, text)));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| QueryError::ParseError(e.to_string()))?;

        if let Some(error) = envelope.errors.first() {
            return Err(QueryError::RequestFailed(error.message.clone()));
        }

        envelope
            .data
            .ok_or_else(|| QueryError::ParseError("No data in response".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackDelegationsData {
    #[serde(default)]
    voting_delegations: Option<Vec<RawDelegation>>,
    #[serde(default)]
    proposals_connection: Option<ProposalsConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProposalsConnection {
    total_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllDelegationsData {
    #[serde(default)]
    voting_delegations: Option<Vec<RawDelegation>>,
}

#[async_trait]
impl ChainDataService for SubsquidClient {
    fn id(&self) -> &str {
        &self.url_template
    }

    async fn track_delegations(&self, query: &TrackQuery) -> Result<TrackQueryResponse, QueryError> {
        debug!(network = %query.network, track = %query.track, "Querying track delegations");

        let data: TrackDelegationsData = self
            .post(
                &query.network,
                TRACK_DELEGATIONS_QUERY,
                json!({
                    "track_eq": query.track.0,
                    "address": query.addresses,
                    "active_states": ACTIVE_PROPOSAL_STATES,
                }),
            )
            .await?;

        Ok(TrackQueryResponse {
            delegations: data.voting_delegations.unwrap_or_default(),
            active_proposals_count: data
                .proposals_connection
                .map(|c| c.total_count)
                .unwrap_or(0),
        })
    }

    async fn all_track_delegations(
        &self,
        network: &str,
        track: TrackId,
    ) -> Result<Vec<RawDelegation>, QueryError> {
        debug!(network, track = %track, "Querying all delegations on track");

        let data: AllDelegationsData = self
            .post(network, ALL_TRACK_DELEGATIONS_QUERY, json!({ "track_num": track.0 }))
            .await?;

        Ok(data.voting_delegations.unwrap_or_default())
    }
}
