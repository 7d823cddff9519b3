//! Blocking HTTP implementations of the `sch_core::remote` seams.

pub mod auth;
pub mod client;
pub mod geocoding;
pub mod incidents;
pub mod multipart;
pub mod users;

pub use auth::HttpAuthApi;
pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use geocoding::{NominatimGeocoder, DEFAULT_GEOCODER_URL};
pub use incidents::HttpIncidentApi;
pub use users::HttpUserApi;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_share_one_client_configuration() {
        let client = ApiClient::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_timeout(std::time::Duration::from_secs(3))
            .with_token(Some("t0k3n".to_string()));
        let incidents = HttpIncidentApi::new(client.clone());
        assert_eq!(incidents.client().timeout().as_secs(), 3);
        assert!(incidents.client().is_authenticated());
        let _ = HttpAuthApi::new(client.clone());
        let _ = HttpUserApi::new(client);
    }

    #[test]
    fn geocoder_url_is_validated() {
        assert!(NominatimGeocoder::new(DEFAULT_GEOCODER_URL).is_ok());
        assert_eq!(
            NominatimGeocoder::new("nominatim").unwrap_err().code,
            "CONFIG_GEOCODER_URL_INVALID"
        );
    }
}
