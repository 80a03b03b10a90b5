//! Authenticated fetch + fan-out aggregation
//!
//! A primary collection is fetched first, then one secondary request per
//! element is issued concurrently. The join is all-or-nothing.

pub mod group;

pub use group::group_by_device;

use std::future::Future;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::arduino::{AccessToken, ApiClient, ApiDevice, ApiThing};
use crate::error::AppError;
use crate::models::{Device, Property, Thing};

/// Parent record with the sub-resources fetched for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithChildren<P, C> {
    #[serde(flatten)]
    pub parent: P,
    pub children: Vec<C>,
}

/// Runs `fetch` for every parent concurrently and pairs each parent with
/// its own result. The first failure fails the whole call.
pub async fn fan_out<P, C, F, Fut>(
    parents: Vec<P>,
    fetch: F,
) -> Result<Vec<WithChildren<P, C>>, AppError>
where
    F: Fn(&P) -> Fut,
    Fut: Future<Output = Result<Vec<C>, AppError>>,
{
    let children = try_join_all(parents.iter().map(fetch)).await?;

    Ok(parents
        .into_iter()
        .zip(children)
        .map(|(parent, children)| WithChildren { parent, children })
        .collect())
}

pub type ThingWithProperties = WithChildren<ApiThing, Property>;
pub type DeviceWithThings = WithChildren<ApiDevice, ThingWithProperties>;

pub struct Aggregator<'a> {
    client: &'a ApiClient,
    token: &'a AccessToken,
}

impl<'a> Aggregator<'a> {
    pub fn new(client: &'a ApiClient, token: &'a AccessToken) -> Self {
        Self { client, token }
    }

    pub async fn list_devices(&self) -> Result<Vec<ApiDevice>, AppError> {
        self.client
            .get_json(self.client.api_url(&["devices"]), &[], self.token, "devices")
            .await
    }

    pub async fn list_things(&self, device_id: Option<&str>) -> Result<Vec<ApiThing>, AppError> {
        let url = self.client.api_url(&["things"]);
        match device_id {
            Some(id) => {
                let resource = format!("things of device {id}");
                self.client
                    .get_json(url, &[("device_id", id)], self.token, &resource)
                    .await
            }
            None => self.client.get_json(url, &[], self.token, "things").await,
        }
    }

    pub async fn list_properties(&self, thing_id: &str) -> Result<Vec<Property>, AppError> {
        let resource = format!("properties of thing {thing_id}");
        self.client
            .get_json(
                self.client.api_url(&["things", thing_id, "properties"]),
                &[],
                self.token,
                &resource,
            )
            .await
    }

    pub async fn attach_properties(
        &self,
        things: Vec<ApiThing>,
    ) -> Result<Vec<ThingWithProperties>, AppError> {
        fan_out(things, |thing| {
            let thing_id = thing.id.clone();
            async move { self.list_properties(&thing_id).await }
        })
        .await
    }

    /// `/things`, then properties for every thing
    pub async fn things_with_properties(&self) -> Result<Vec<ThingWithProperties>, AppError> {
        let things = self.list_things(None).await?;
        tracing::info!("Fetching properties for {} things", things.len());
        self.attach_properties(things).await
    }

    /// `/devices`, then the things of every device, then properties for every thing
    pub async fn devices_with_things(&self) -> Result<Vec<DeviceWithThings>, AppError> {
        let devices = self.list_devices().await?;
        tracing::info!("Fetching things for {} devices", devices.len());

        fan_out(devices, |device| {
            let device_id = device.id.clone();
            async move {
                let things = self.list_things(Some(&device_id)).await?;
                self.attach_properties(things).await
            }
        })
        .await
    }
}

pub fn into_things(things: Vec<ThingWithProperties>) -> Vec<Thing> {
    things
        .into_iter()
        .map(|t| Thing::from_api(t.parent, t.children))
        .collect()
}

/// Devices-first result as view models; devices without things are kept.
///
/// Things were fetched with a `device_id` filter, so the device they were
/// fetched for is their owner: each thing's `device_id` is overwritten with
/// the parent id, whatever the record itself reported.
pub fn into_devices(devices: Vec<DeviceWithThings>) -> Vec<Device> {
    devices
        .into_iter()
        .map(|d| {
            let device_id = d.parent.id.clone();
            let things = into_things(d.children)
                .into_iter()
                .map(|mut thing| {
                    if thing.device_id != device_id {
                        tracing::debug!(
                            "Thing {} reported device '{}', filed under {}",
                            thing.id,
                            thing.device_id,
                            device_id
                        );
                        thing.device_id = device_id.clone();
                    }
                    thing
                })
                .collect();
            Device::from_api(d.parent, things)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::arduino::ApiConfig;

    async fn setup() -> (MockServer, ApiClient, AccessToken) {
        let server = MockServer::start().await;
        let config = ApiConfig::new(&server.uri(), &server.uri(), Duration::from_secs(5)).unwrap();
        (server, ApiClient::new(config).unwrap(), AccessToken::new("tok-123"))
    }

    async fn mount_properties(server: &MockServer, thing_id: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/things/{thing_id}/properties")))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fan_out_preserves_order_and_pairs_positionally() {
        let parents = vec![3_u64, 1, 2];

        let merged = fan_out(parents, |&n| async move {
            tokio::time::sleep(Duration::from_millis(n * 10)).await;
            Ok::<_, AppError>(vec![n * 100])
        })
        .await
        .unwrap();

        let pairs: Vec<(u64, Vec<u64>)> = merged.into_iter().map(|w| (w.parent, w.children)).collect();
        assert_eq!(pairs, vec![(3, vec![300]), (1, vec![100]), (2, vec![200])]);
    }

    #[tokio::test]
    async fn test_fan_out_fails_if_any_request_fails() {
        let result = fan_out(vec![1, 2, 3], |&n| async move {
            if n == 2 {
                Err(AppError::upstream("properties", Some(500), "boom"))
            } else {
                Ok(vec![n])
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::UpstreamFetch { status: Some(500), .. })));
    }

    #[tokio::test]
    async fn test_fan_out_on_empty_parents() {
        let merged = fan_out(Vec::<u8>::new(), |_| async { Ok::<Vec<u8>, AppError>(Vec::new()) })
            .await
            .unwrap();
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_things_with_properties_one_request_per_thing() {
        let (server, client, token) = setup().await;

        Mock::given(method("GET"))
            .and(path("/things"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "t1", "name": "Weather", "device_id": "d1"},
                {"id": "t2", "name": "Pump", "device_id": "d1"},
                {"id": "t3", "name": "Door", "device_id": "d2"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        mount_properties(&server, "t1", json!([{"id": "p1", "name": "temperature", "type": "FLOAT", "last_value": 21.5}])).await;
        mount_properties(&server, "t2", json!([])).await;
        mount_properties(&server, "t3", json!([{"id": "p3", "name": "open", "type": "STATUS", "last_value": false}])).await;

        let merged = Aggregator::new(&client, &token)
            .things_with_properties()
            .await
            .unwrap();

        let ids: Vec<&str> = merged.iter().map(|t| t.parent.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert_eq!(merged[0].children[0].id, "p1");
        assert!(merged[1].children.is_empty());
        assert_eq!(merged[2].children[0].name, "open");
    }

    #[tokio::test]
    async fn test_single_property_failure_fails_aggregation() {
        let (server, client, token) = setup().await;

        Mock::given(method("GET"))
            .and(path("/things"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "t1", "device_id": "d1"},
                {"id": "t2", "device_id": "d1"}
            ])))
            .mount(&server)
            .await;

        mount_properties(&server, "t1", json!([])).await;

        Mock::given(method("GET"))
            .and(path("/things/t2/properties"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let result = Aggregator::new(&client, &token).things_with_properties().await;

        match result {
            Err(AppError::UpstreamFetch { resource, status, message }) => {
                assert_eq!(resource, "properties of thing t2");
                assert_eq!(status, Some(503));
                assert_eq!(message, "unavailable");
            }
            other => panic!("expected UpstreamFetch error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_devices_with_things_filters_by_device() {
        let (server, client, token) = setup().await;

        Mock::given(method("GET"))
            .and(path("/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "d1", "name": "Greenhouse", "serial": "S1", "type": "mkrwifi1010"},
                {"id": "d2", "name": "Spare"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/things"))
            .and(query_param("device_id", "d1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "t1", "name": "Weather", "created_at": "2024-03-05T10:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/things"))
            .and(query_param("device_id", "d2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        mount_properties(&server, "t1", json!([{"id": "p1", "name": "humidity", "type": "INT", "last_value": 0}])).await;

        let devices = into_devices(
            Aggregator::new(&client, &token)
                .devices_with_things()
                .await
                .unwrap(),
        );

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Greenhouse");
        assert_eq!(devices[0].things.len(), 1);
        assert_eq!(devices[0].things[0].device_id, "d1");
        assert_eq!(devices[0].things[0].properties[0].name, "humidity");
        assert_eq!(devices[1].id, "d2");
        assert!(devices[1].things.is_empty());
    }

    #[test]
    fn test_into_devices_files_things_under_fetching_device() {
        let thing = |id: &str, device_id: Option<&str>| WithChildren {
            parent: ApiThing {
                id: id.to_string(),
                name: Some(format!("Thing {id}")),
                device_id: device_id.map(str::to_string),
                device_name: None,
                created_at: None,
            },
            children: Vec::<Property>::new(),
        };
        let fetched = vec![WithChildren {
            parent: ApiDevice {
                id: "d1".to_string(),
                name: Some("Greenhouse".to_string()),
                serial: None,
                device_type: None,
            },
            children: vec![thing("t1", Some("d1")), thing("t2", Some("d2")), thing("t3", None)],
        }];

        let devices = into_devices(fetched);

        assert_eq!(devices.len(), 1);
        let owners: Vec<&str> = devices[0].things.iter().map(|t| t.device_id.as_str()).collect();
        assert_eq!(owners, vec!["d1", "d1", "d1"]);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_upstream_error() {
        let (server, client, token) = setup().await;

        Mock::given(method("GET"))
            .and(path("/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = Aggregator::new(&client, &token).list_devices().await;

        assert!(matches!(result, Err(AppError::UpstreamFetch { status: Some(200), .. })));
    }

    #[test]
    fn test_with_children_serializes_flat() {
        let merged = WithChildren {
            parent: ApiThing {
                id: "t1".to_string(),
                name: Some("Weather".to_string()),
                device_id: Some("d1".to_string()),
                device_name: None,
                created_at: None,
            },
            children: Vec::<Property>::new(),
        };

        let out = serde_json::to_value(&merged).unwrap();
        assert_eq!(out["id"], "t1");
        assert_eq!(out["children"], json!([]));
    }
}
