//! Indexer access.
//!
//! [`IndexerClient`] talks to the two indexed backends the dashboard uses:
//! a GraphQL subgraph (governance voters) and the REST API (pools, staking
//! actions, redeems). The paginated queries are exposed as
//! [`PageSource`](crate::pipeline::PageSource) implementations so they can
//! drive a [`PagedList`](crate::pipeline::PagedList).

mod pools;
mod redeems;
mod transactions;
mod voters;

use std::{fmt::Display, str::FromStr};

use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{error::DashboardError, pipeline::Page};

pub use pools::{MARKETS, MarketMeta, PoolMeta, fetch_pools, pools_table};
pub use redeems::{JuniorRedeem, JuniorRedeemSource};
pub use transactions::{PoolTx, PoolTxFilter, PoolTxSource, PoolTxType};
pub use voters::{Voter, VoterSource, fetch_voter_count, voting_power};

/// Client of the GraphQL subgraph and the REST API.
#[derive(Clone, Debug)]
pub struct IndexerClient {
    client: Client,
    graph_url: Url,
    api_url: Url,
}

impl IndexerClient {
    pub fn new(client: Client, graph_url: Url, api_url: Url) -> Self {
        Self {
            client,
            graph_url,
            api_url,
        }
    }

    /// Performs GraphQL query against the subgraph.
    pub async fn graphql<T>(
        &self,
        query: &str,
        variables: Option<Map<String, Value>>,
    ) -> Result<T, DashboardError>
    where
        T: DeserializeOwned,
    {
        self.client
            .post(self.graph_url.clone())
            .json(&Query { query, variables })
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse<T>>()
            .await?
            .into_result()
    }

    /// Fetches one page of a REST list endpoint returning
    /// `{ "data": [...], "meta": { "count": N } }`.
    pub async fn paginated<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Page<T>, DashboardError>
    where
        T: DeserializeOwned,
    {
        let response: PaginatedResponse<T> = self.get(path, params).await?;
        Ok(response.into_page())
    }

    /// Fetches a REST endpoint returning `{ "data": ... }`.
    pub async fn data<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, DashboardError>
    where
        T: DeserializeOwned,
    {
        let response: DataResponse<T> = self.get(path, params).await?;
        Ok(response.data)
    }

    async fn get<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, DashboardError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .api_url
            .join(path)
            .map_err(|err| DashboardError::InvalidRequest(format!("{path}: {err}")))?;
        tracing::trace!(%url, ?params, "Indexer request");
        Ok(self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?)
    }
}

#[derive(Serialize)]
struct Query<'a> {
    query: &'a str,
    variables: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "empty_data")]
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<QueryError>>,
}

impl<T> QueryResponse<T> {
    fn into_result(self) -> Result<T, DashboardError> {
        match self {
            Self {
                data: Some(data),
                errors: None,
            } => Ok(data),
            Self {
                errors: Some(errors),
                ..
            } if !errors.is_empty() => {
                // Only the first error is returned
                for error in &errors[1..] {
                    tracing::warn!(message = %error.message, "Additional GraphQL error");
                }
                Err(DashboardError::Indexer(errors[0].message.clone()))
            }
            _ => Err(DashboardError::Indexer(
                "invalid GraphQL response".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryError {
    message: String,
}

// `#[serde(default)]` on `Option<T>` would require `T: Default`
fn empty_data<T>() -> Option<T> {
    None
}

#[derive(Debug, Deserialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    meta: PaginatedMeta,
}

#[derive(Debug, Deserialize)]
struct PaginatedMeta {
    #[serde(deserialize_with = "de_decimal")]
    count: usize,
}

impl<T> PaginatedResponse<T> {
    fn into_page(self) -> Page<T> {
        Page::new(self.data, self.meta.count)
    }
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// Deserializes an integer sent either as JSON number or as decimal string,
/// the way subgraphs encode `BigInt`s.
pub(crate) fn de_decimal<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Str(value) => value.trim().parse().map_err(serde::de::Error::custom),
        Raw::Num(value) => value.to_string().parse().map_err(serde::de::Error::custom),
    }
}

/// Parses base units of a token amount, naming the offending field on failure.
pub(crate) fn parse_units(
    field: &'static str,
    value: &str,
) -> Result<alloy::primitives::U256, DashboardError> {
    alloy::primitives::U256::from_str_radix(value.trim(), 10).map_err(|_| {
        DashboardError::InvalidValue {
            field,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use serde_json::json;

    use super::*;

    fn response_from_json<T: DeserializeOwned>(value: Value) -> Result<T, DashboardError> {
        serde_json::from_value::<QueryResponse<T>>(value)
            .unwrap()
            .into_result()
    }

    #[test]
    fn test_serialize_query() {
        let mut variables = Map::new();
        variables.insert("limit".to_string(), json!(10));
        assert_eq!(
            serde_json::to_value(Query {
                query: "{ overview { comitiumUsers } }",
                variables: Some(variables),
            })
            .unwrap(),
            json!({
                "query": "{ overview { comitiumUsers } }",
                "variables": { "limit": 10 },
            })
        );
    }

    #[test]
    fn test_graphql_data() {
        let data: Value = response_from_json(json!({ "data": { "a": 1 } })).unwrap();
        assert_eq!(data, json!({ "a": 1 }));
    }

    #[test]
    fn test_graphql_first_error_returned() {
        let result = response_from_json::<Value>(json!({
            "errors": [{ "message": "first" }, { "message": "second" }],
        }));
        assert!(matches!(result, Err(DashboardError::Indexer(msg)) if msg == "first"));

        let result = response_from_json::<Value>(json!({
            "data": { "a": 1 },
            "errors": [{ "message": "partial" }],
        }));
        assert!(matches!(result, Err(DashboardError::Indexer(msg)) if msg == "partial"));
    }

    #[test]
    fn test_graphql_invalid_response() {
        assert!(response_from_json::<Value>(json!({})).is_err());
        assert!(response_from_json::<Value>(json!({ "errors": [] })).is_err());
    }

    #[test]
    fn test_paginated_response() {
        let response: PaginatedResponse<u32> =
            serde_json::from_value(json!({ "data": [1, 2], "meta": { "count": "12" } })).unwrap();
        assert_eq!(response.into_page(), Page::new(vec![1, 2], 12));

        let response: PaginatedResponse<u32> =
            serde_json::from_value(json!({ "data": [], "meta": { "count": 0 } })).unwrap();
        assert_eq!(response.into_page(), Page::empty());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(
            parse_units("amount", "1000000000000000000").unwrap(),
            U256::from(10u64.pow(18))
        );
        assert!(matches!(
            parse_units("amount", "1.5"),
            Err(DashboardError::InvalidValue { field: "amount", .. })
        ));
    }
}
