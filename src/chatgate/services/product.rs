//! Product catalogue ("webflux") tools.

use serde_json::Value as JsonValue;

use super::client::ServiceClient;
use super::render::{field_text, list_reply, reply, Outcome};
use super::ToolOutput;
use crate::chatgate::tool_protocol::{
    required_f64, required_str, ToolMetadata, ToolParameter, ToolParameterType,
};
use crate::chatgate::tool_protocols::CustomToolProtocol;

pub async fn all_products(client: &ServiceClient, _params: &JsonValue) -> ToolOutput {
    Ok(match client.get_json("", &[]).await {
        Ok(body) => list_reply(&body, "All products", "No products found.".to_string()),
        Err(e) => reply(Outcome::Error, format!("Error fetching products: {}", e)),
    })
}

pub async fn products_below_price(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    // `{:?}` keeps the decimal point: 10 is sent as `10.0`.
    let price = format!("{:?}", required_f64(params, "price")?);
    let path = format!("/filter/price/{}", price);
    Ok(match client.get_json(&path, &[]).await {
        Ok(body) => list_reply(
            &body,
            &format!("Products below price {}", price),
            format!("No products found below price {}.", price),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching products below price {}: {}", price, e),
        ),
    })
}

/// One markdown bullet per product, details taken from its nested `data` object.
fn product_line(product: &JsonValue) -> String {
    let missing = JsonValue::Null;
    let data = product.get("data").unwrap_or(&missing);
    format!(
        "- **{}** (Price: {}, Color: {}, Capacity: {})",
        field_text(product, "name", "Unknown"),
        field_text(data, "price", "N/A"),
        field_text(data, "color", "N/A"),
        field_text(data, "capacity", "N/A")
    )
}

pub async fn products_by_name(client: &ServiceClient, params: &JsonValue) -> ToolOutput {
    let name = required_str(params, "name")?;
    let path = format!("/search/{}", urlencoding::encode(&name));
    Ok(match client.get_json(&path, &[]).await {
        Ok(JsonValue::Array(products)) if !products.is_empty() => {
            let lines: Vec<String> = products.iter().map(product_line).collect();
            reply(
                Outcome::Ok,
                format!("Products with name '{}':\n\n{}", name, lines.join("\n")),
            )
        }
        Ok(JsonValue::Object(fields)) if fields.is_empty() => reply(
            Outcome::Empty,
            format!("No products found with name '{}'.", name),
        ),
        Ok(JsonValue::Array(_)) | Ok(JsonValue::Null) => reply(
            Outcome::Empty,
            format!("No products found with name '{}'.", name),
        ),
        Ok(other) => reply(
            Outcome::Ok,
            format!("Products with name '{}':\n\n{}", name, product_line(&other)),
        ),
        Err(e) => reply(
            Outcome::Error,
            format!("Error fetching products with name '{}': {}", name, e),
        ),
    })
}

/// Register the product tools on `protocol`, in catalogue order.
pub async fn register_tools(protocol: &CustomToolProtocol, client: &ServiceClient) {
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_all_products", "Fetch all products."),
        all_products
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_products_below_price", "Fetch products below a certain price.")
            .with_parameter(
                ToolParameter::new("price", ToolParameterType::Number)
                    .with_description("Exclusive upper price bound")
                    .required(),
            ),
        products_below_price
    );
    register_tool!(
        protocol,
        client,
        ToolMetadata::new("get_products_by_name", "Fetch products by name.").with_parameter(
            ToolParameter::new("name", ToolParameterType::String)
                .with_description("Product name to search for")
                .required(),
        ),
        products_by_name
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_line_defaults_missing_fields() {
        let full = json!({"name": "Phone", "data": {"price": 999.5, "color": "black", "capacity": "128 GB"}});
        assert_eq!(
            product_line(&full),
            "- **Phone** (Price: 999.5, Color: black, Capacity: 128 GB)"
        );

        let bare = json!({"id": "7"});
        assert_eq!(
            product_line(&bare),
            "- **Unknown** (Price: N/A, Color: N/A, Capacity: N/A)"
        );
    }
}
