//! Movie catalogue ("json-to-java") tools.
//!
//! These answers embed the downstream JSON as-is; the model does the summarising.

use serde_json::Value as JsonValue;

use super::client::{Lookup, ServiceClient};
use super::render::{reply, Outcome};
use super::ToolOutput;
use crate::chatgate::tool_protocol::{
    required_f64, required_i64, ToolMetadata, ToolParameter, ToolParameterType,
};
use crate::chatgate::tool_protocols::CustomToolProtocol;

pub async fn all_movies(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("", &[]).await {
        Ok(body) => reply(Outcome::Ok, format!("All movies: {}", body)),
        Err(e) => reply(Outcome::Error, format!("Error fetching movies: {}", e)),
    })
}

pub async fn titles(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("/titles", &[]).await {
        Ok(body) => reply(Outcome::Ok, format!("Titles: {}", body)),
        Err(e) => reply(Outcome::Error, format!("Error fetching titles: {}", e)),
    })
}

pub async fn movie_by_track_id(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let track_id = required_i64(params, "track_id")?;
    Ok(match client.get_resource(&format!("/{}", track_id)).await {
        Ok(Lookup::Found(movie)) => reply(Outcome::Ok, format!("Movie: {}", movie)),
        Ok(Lookup::NotFound) => reply(
            Outcome::NotFound,
            format!("No movie found with track ID {}.", track_id),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching movie by track ID {}: {}", track_id, e),
        ),
    })
}

pub async fn movies_cheaper_than(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let max_price = required_f64(params, "max_price")?;
    let query = [("max", max_price.to_string())];
    Ok(match client.get_json("/filter/price", &query).await {
        Ok(body) => reply(
            Outcome::Ok,
            format!("Movies with price less than {}: {}", max_price, body),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching movies by price less than {}: {}", max_price, e),
        ),
    })
}

/// Register the movie tools on `protocol`, in catalogue order.
pub async fn register_tools(protocol: &CustomToolProtocol, client: &ServiceClient) {
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_all_movies", "Fetch all movies."),
        all_movies
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_titles", "Fetch all trackName and collectionName pairs."),
        titles
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_movie_by_track_id", "Fetch a movie by its track ID.")
            .with_parameter(
                ToolParameter::new("track_id", ToolParameterType::Integer)
                    .with_description("iTunes track identifier")
                    .required(),
            ),
        movie_by_track_id
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new(
            "get_movies_by_price_less_than",
            "Fetch movies with collectionPrice less than the given max price.",
        )
        .with_parameter(
            ToolParameter::new("max_price", ToolParameterType::Number)
                .with_description("Exclusive upper bound on collectionPrice")
                .required(),
        ),
        movies_cheaper_than
    );
}
