//! Callback request form: public lead capture.
//!
//! Accepts a urlencoded form or JSON body. Bots filling the hidden `company`
//! field get a success answer and nothing is stored. Each client (IP plus
//! user agent) may submit 8 times per hour.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{
        StatusCode,
        header::{CONTENT_TYPE, RETRY_AFTER},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use hrtaj_core::whatsapp::{WhatsAppParams, build_link, build_message_encoded};
use hrtaj_core::{LeadId, Locale, normalize_egypt_phone};

use super::RequestMeta;
use crate::error::ApiError;
use crate::models::NewLead;
use crate::services::RateDecision;
use crate::state::AppState;

const CONTACT_METHODS: &[&str] = &["whatsapp", "call", "email"];
const CONTACT_TIMES: &[&str] = &["morning", "afternoon", "evening", "any"];

/// Raw form fields. Everything is optional so a malformed submission is
/// reported as `invalid` rather than as a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub contact_method: Option<String>,
    pub preferred_time: Option<String>,
    pub preferred_day: Option<String>,
    pub reason: Option<String>,
    /// Honeypot.
    pub company: Option<String>,
}

/// A validated callback request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CallbackRequest {
    name: String,
    phone: String,
    phone_e164: String,
    contact_method: String,
    preferred_time: String,
    preferred_day: Option<String>,
    reason: Option<String>,
}

impl CallbackRequest {
    /// `contact_method=…`, plus ` | preferred_day=…` when a day was given.
    fn notes(&self) -> String {
        let mut notes = format!("contact_method={}", self.contact_method);
        if let Some(day) = &self.preferred_day {
            notes.push_str(" | preferred_day=");
            notes.push_str(day);
        }
        notes
    }

    fn into_lead(self, id: LeadId) -> NewLead {
        let notes = self.notes();
        NewLead {
            id,
            name: self.name,
            phone: self.phone,
            phone_e164: Some(self.phone_e164),
            message: self.reason,
            preferred_contact_time: Some(self.preferred_time),
            notes: Some(notes),
            source: "callback".to_owned(),
        }
    }
}

/// Mojibake or runs of question marks left by broken encodings.
fn has_garbage(value: &str) -> bool {
    value.contains("???") || value.contains("ï¿½")
}

fn field(value: Option<&String>) -> &str {
    value.map_or("", |v| v.trim())
}

fn validate(form: &CallbackForm) -> Option<CallbackRequest> {
    let name = field(form.name.as_ref());
    let phone = field(form.phone.as_ref());
    let contact_method = field(form.contact_method.as_ref());
    let preferred_time = field(form.preferred_time.as_ref());
    let preferred_day = field(form.preferred_day.as_ref());
    let reason = field(form.reason.as_ref());

    let fields = [name, phone, contact_method, preferred_time, preferred_day, reason];
    if fields.iter().any(|v| has_garbage(v)) {
        return None;
    }

    let len = |v: &str| v.chars().count();
    let valid = (2..=80).contains(&len(name))
        && (7..=30).contains(&len(phone))
        && CONTACT_METHODS.contains(&contact_method)
        && CONTACT_TIMES.contains(&preferred_time)
        && len(preferred_day) <= 60
        && len(reason) <= 400;
    if !valid {
        return None;
    }

    let phone_e164 = normalize_egypt_phone(phone)?;
    let optional = |v: &str| (!v.is_empty()).then(|| v.to_owned());

    Some(CallbackRequest {
        name: name.to_owned(),
        phone: phone.to_owned(),
        phone_e164,
        contact_method: contact_method.to_owned(),
        preferred_time: preferred_time.to_owned(),
        preferred_day: optional(preferred_day),
        reason: optional(reason),
    })
}

fn invalid() -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "invalid")
}

/// Parse the body as JSON or as a urlencoded form, by content type.
async fn read_form(request: Request, state: &AppState) -> Result<CallbackForm, ApiError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let parsed = if is_json {
        Json::<CallbackForm>::from_request(request, state)
            .await
            .map(|Json(form)| form)
            .map_err(|e| e.body_text())
    } else {
        Form::<CallbackForm>::from_request(request, state)
            .await
            .map(|Form(form)| form)
            .map_err(|e| e.body_text())
    };

    parsed.map_err(|e| {
        tracing::debug!(error = %e, "Rejected callback body");
        invalid()
    })
}

/// Follow-up WhatsApp link for the `whatsapp` contact method.
fn whatsapp_link(state: &AppState, locale: Locale, request_id: LeadId) -> Option<String> {
    let whatsapp = &state.config().whatsapp;
    let number = whatsapp.number.as_deref()?;
    let params = WhatsAppParams {
        brand: Some(locale.brand().to_owned()),
        reference: Some(request_id.to_string()),
        ..WhatsAppParams::default()
    };
    let encoded = build_message_encoded(&params, Some(whatsapp.callback_template(locale)), locale);
    build_link(Some(number), &encoded)
}

/// Submit a callback request.
#[instrument(skip_all)]
pub async fn submit(State(state): State<AppState>, meta: RequestMeta, request: Request) -> Response {
    let locale = request
        .extensions()
        .get::<Locale>()
        .copied()
        .unwrap_or_default();

    let form = match read_form(request, &state).await {
        Ok(form) => form,
        Err(e) => return e.into_response(),
    };

    if !field(form.company.as_ref()).is_empty() {
        tracing::info!("Callback honeypot triggered");
        return Json(json!({ "ok": true })).into_response();
    }

    let key = format!(
        "callback:{}:{}",
        meta.ip.as_deref().unwrap_or("unknown"),
        meta.user_agent.as_deref().unwrap_or("unknown")
    );
    if let RateDecision::Limited { retry_after } = state.callback_limiter().check(&key).await {
        tracing::warn!(retry_after_secs = retry_after.as_secs(), "Callback rate limited");
        let error = ApiError::new(StatusCode::TOO_MANY_REQUESTS, "rate_limit");
        return ([(RETRY_AFTER, retry_after.as_secs().to_string())], error).into_response();
    }

    let Some(callback) = validate(&form) else {
        return invalid().into_response();
    };

    let request_id = LeadId::generate();
    let wants_whatsapp = callback.contact_method == "whatsapp";
    if let Err(e) = state.leads().insert(&callback.into_lead(request_id)).await {
        return ApiError::from_failure(StatusCode::INTERNAL_SERVER_ERROR, "server", &e)
            .into_response();
    }
    tracing::info!(lead_id = %request_id, "Callback request stored");

    let link = if wants_whatsapp {
        whatsapp_link(&state, locale, request_id)
    } else {
        None
    };

    Json(json!({ "ok": true, "requestId": request_id, "whatsappLink": link })).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CallbackForm {
        CallbackForm {
            name: Some(" Mona ".to_owned()),
            phone: Some("010 1234 5678".to_owned()),
            contact_method: Some("whatsapp".to_owned()),
            preferred_time: Some("evening".to_owned()),
            preferred_day: Some(String::new()),
            reason: Some("Apartment in Maadi".to_owned()),
            company: None,
        }
    }

    #[test]
    fn test_validate_accepts_and_normalizes() {
        let request = validate(&form()).unwrap();
        assert_eq!(request.name, "Mona");
        assert_eq!(request.phone, "010 1234 5678");
        assert_eq!(request.phone_e164, "+201012345678");
        assert_eq!(request.preferred_day, None);
        assert_eq!(request.reason.as_deref(), Some("Apartment in Maadi"));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let mut f = form();
        f.reason = Some("???".to_owned());
        assert!(validate(&f).is_none());

        let mut f = form();
        f.name = Some("Monaï¿½".to_owned());
        assert!(validate(&f).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let cases: [fn(&mut CallbackForm); 6] = [
            |f| f.name = Some("M".to_owned()),
            |f| f.phone = Some("123".to_owned()),
            |f| f.contact_method = Some("fax".to_owned()),
            |f| f.preferred_time = Some("night".to_owned()),
            |f| f.preferred_day = Some("d".repeat(61)),
            |f| f.reason = Some("r".repeat(401)),
        ];
        for mutate in cases {
            let mut f = form();
            mutate(&mut f);
            assert!(validate(&f).is_none());
        }
    }

    #[test]
    fn test_validate_rejects_unnormalizable_phone() {
        let mut f = form();
        f.phone = Some("12-34-56-78".to_owned());
        assert!(validate(&f).is_none());
    }

    #[test]
    fn test_notes_and_lead() {
        let mut f = form();
        f.preferred_day = Some("Sunday".to_owned());
        let request = validate(&f).unwrap();
        assert_eq!(request.notes(), "contact_method=whatsapp | preferred_day=Sunday");

        let id = LeadId::generate();
        let lead = request.into_lead(id);
        assert_eq!(lead.id, id);
        assert_eq!(lead.source, "callback");
        assert_eq!(lead.preferred_contact_time.as_deref(), Some("evening"));
        assert_eq!(lead.message.as_deref(), Some("Apartment in Maadi"));
    }
}
