use axum::{
    Json,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::service::VillainOrder;
use crate::types::{Theme, Tier};

/// JSON body of `POST /api/villains`.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub theme: String,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub portrait: bool,
    #[serde(default)]
    pub upload_id: Option<i64>,
}

impl GenerateBody {
    /// Resolve the free-form theme and tier names.
    pub fn into_order(self) -> Result<VillainOrder, crate::ForgeError> {
        let theme: Theme = self.theme.parse()?;
        let tier: Tier = self.tier.as_deref().unwrap_or_default().parse()?;
        Ok(VillainOrder {
            theme,
            power: self.power.filter(|p| !p.trim().is_empty()),
            tier,
            portrait: self.portrait,
            upload_id: self.upload_id,
        })
    }
}

/// Parses and pre-validates a generation request.
pub struct VillainRequest(pub VillainOrder);

impl<S> FromRequest<S> for VillainRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = match Json::<GenerateBody>::from_request(req, &()).await {
            Ok(v) => v,
            Err(rejection) => return Err(rejection.into_response()),
        };
        match body.into_order() {
            Ok(order) => Ok(VillainRequest(order)),
            Err(e) => Err(e.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForgeError;

    fn body(theme: &str, tier: Option<&str>) -> GenerateBody {
        GenerateBody {
            theme: theme.to_string(),
            power: Some("  ".to_string()),
            tier: tier.map(str::to_string),
            portrait: false,
            upload_id: None,
        }
    }

    #[test]
    fn tier_defaults_to_standard() {
        let order = body("sci-fi", None).into_order().unwrap();
        assert_eq!(order.theme, Theme::SciFi);
        assert_eq!(order.tier, Tier::Standard);
        assert_eq!(order.power, None);
    }

    #[test]
    fn unknown_names_are_invalid_selections() {
        assert!(matches!(
            body("romcom", None).into_order(),
            Err(ForgeError::InvalidSelection(_))
        ));
        assert!(matches!(
            body("dark", Some("platinum")).into_order(),
            Err(ForgeError::InvalidSelection(_))
        ));
    }
}
