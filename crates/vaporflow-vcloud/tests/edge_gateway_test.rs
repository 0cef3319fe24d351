//! Edge gateway service configuration is a bulk overwrite, not a diff.

mod common;

use common::{Call, MockService};
use serde_json::json;
use std::sync::Arc;
use vaporflow_vcloud::{EdgeGateway, VcloudError};

const EDGE_ID: &str = "edgeGateway-0a1b-2c3d";

fn seeded_mock() -> Arc<MockService> {
    let mock = Arc::new(MockService::new());
    mock.add_query_result(
        "edgeGateway",
        Some("name==edge-1"),
        vec![json!({
            "name": "edge-1",
            "href": format!("https://api.example.com/api/edgeGateway/{EDGE_ID}"),
        })],
    );
    mock
}

#[tokio::test]
async fn get_by_name_resolves_identifier_from_href() {
    let mock = seeded_mock();

    let gateway = EdgeGateway::get_by_name(mock.clone(), "edge-1").await.unwrap();

    assert_eq!(gateway.id().as_str(), EDGE_ID);
}

#[tokio::test]
async fn get_by_name_with_no_match_is_not_found() {
    let mock = Arc::new(MockService::new());

    let result = EdgeGateway::get_by_name(mock, "edge-9").await;

    assert!(matches!(result, Err(VcloudError::NotFound(_))));
}

#[tokio::test]
async fn firewall_fragment_is_posted_verbatim() {
    let mock = seeded_mock();
    let gateway = EdgeGateway::get_by_name(mock.clone(), "edge-1").await.unwrap();

    let configuration = json!({
        "FirewallService": {
            "IsEnabled": "true",
            "DefaultAction": "allow",
            "LogDefaultAction": "false",
            "FirewallRule": [
                {
                    "Id": "999",
                    "IsEnabled": "false",
                    "Policy": "drop",
                    "Protocols": {"Tcp": "true"},
                    "Port": "3412",
                    "DestinationIp": "internal",
                    "SourceIp": "internal",
                }
            ]
        }
    });
    gateway.update_configuration(&configuration).await.unwrap();

    assert_eq!(
        mock.calls(),
        vec![Call::PostEdgeConfiguration {
            id: EDGE_ID.to_string(),
            configuration,
        }]
    );
}

#[tokio::test]
async fn nat_fragment_is_posted_verbatim() {
    let mock = seeded_mock();
    let gateway = EdgeGateway::get_by_name(mock.clone(), "edge-1").await.unwrap();

    let configuration = json!({
        "NatService": {
            "IsEnabled": "true",
            "NatRule": [
                {
                    "RuleType": "SNAT",
                    "IsEnabled": "true",
                    "GatewayNatRule": {
                        "OriginalIp": "10.10.10.10",
                        "TranslatedIp": "203.0.113.7",
                    }
                }
            ]
        }
    });
    gateway.update_configuration(&configuration).await.unwrap();

    // No read-modify-write cycle: a single unconditional post
    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let Call::PostEdgeConfiguration { configuration: posted, .. } = &calls[0] else {
        panic!("expected an edge gateway configuration post");
    };
    assert_eq!(posted, &configuration);
}

#[tokio::test]
async fn malformed_gateway_id_fails_at_construction() {
    let mock = Arc::new(MockService::new());

    let result = EdgeGateway::new(mock, "gateway-12ab");

    assert!(matches!(result, Err(VcloudError::Format(_))));
}
