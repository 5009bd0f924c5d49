//! Conditions over booking fields.

use async_trait::async_trait;

use crate::context::BookingContext;
use crate::error::ConditionError;
use crate::registry::{CheckScope, Condition, ParamKind, ParamSpec, Params};

/// Exact string compare on the status code. Numbers in the rule source are
/// compared by their text, so `value: 1` matches status `"1"`.
pub struct StatusEquals;

const STATUS_PARAMS: &[ParamSpec] = &[ParamSpec::required("value", ParamKind::Scalar)];

#[async_trait]
impl Condition for StatusEquals {
    fn name(&self) -> &'static str {
        "status-equals"
    }

    fn params(&self) -> &'static [ParamSpec] {
        STATUS_PARAMS
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        Ok(ctx.booking.status == params.scalar("value")?)
    }
}

pub struct StatusIn;

const STATUS_LIST_PARAMS: &[ParamSpec] = &[ParamSpec::required("values", ParamKind::ScalarList)];

#[async_trait]
impl Condition for StatusIn {
    fn name(&self) -> &'static str {
        "status-in"
    }

    fn params(&self) -> &'static [ParamSpec] {
        STATUS_LIST_PARAMS
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let values = params.scalar_list("values")?;
        Ok(values.iter().any(|v| *v == ctx.booking.status))
    }
}

/// True iff any keyword is a substring of the booking's option text.
pub struct KeywordPresent;

const KEYWORD_PARAMS: &[ParamSpec] = &[ParamSpec::required("keywords", ParamKind::StrList)];

#[async_trait]
impl Condition for KeywordPresent {
    fn name(&self) -> &'static str {
        "keyword-present"
    }

    fn params(&self) -> &'static [ParamSpec] {
        KEYWORD_PARAMS
    }

    fn check(&self, params: &Params, _scope: &CheckScope<'_>) -> Result<(), String> {
        // An empty keyword is a substring of everything.
        match params.get("keywords").and_then(|v| v.as_array()) {
            Some(items) if items.iter().any(|k| k.as_str() == Some("")) => {
                Err("keywords must not contain an empty string".to_string())
            }
            _ => Ok(()),
        }
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let text = &ctx.booking.option_text;
        Ok(params
            .str_list("keywords")?
            .iter()
            .any(|keyword| text.contains(keyword.as_str())))
    }
}

pub struct StoreIn;

const STORE_PARAMS: &[ParamSpec] = &[ParamSpec::required("ids", ParamKind::StrList)];

#[async_trait]
impl Condition for StoreIn {
    fn name(&self) -> &'static str {
        "store-in"
    }

    fn params(&self) -> &'static [ParamSpec] {
        STORE_PARAMS
    }

    async fn evaluate(&self, ctx: &BookingContext, params: &Params) -> Result<bool, ConditionError> {
        let ids = params.str_list("ids")?;
        Ok(ids.iter().any(|id| *id == ctx.booking.id.store_id))
    }
}

#[cfg(test)]
mod tests {
    use bookwatch_notify::TemplateRenderer;
    use serde_json::json;

    use super::*;
    use crate::conditions::testing::context;
    use crate::schema::TemplateCatalog;

    fn ctx() -> BookingContext {
        context("2026-03-01T18:00:00+09:00", "2026-03-01T12:00:00+09:00")
    }

    #[tokio::test]
    async fn status_compares_as_text() {
        let ctx = ctx();
        assert!(StatusEquals.evaluate(&ctx, &Params::new().with("value", "1")).await.unwrap());
        assert!(StatusEquals.evaluate(&ctx, &Params::new().with("value", 1)).await.unwrap());
        assert!(!StatusEquals.evaluate(&ctx, &Params::new().with("value", "01")).await.unwrap());
    }

    #[tokio::test]
    async fn status_in_list() {
        let ctx = ctx();
        let params = Params::new().with("values", json!([0, "1"]));
        assert!(StatusIn.evaluate(&ctx, &params).await.unwrap());
        let params = Params::new().with("values", json!(["2", "9"]));
        assert!(!StatusIn.evaluate(&ctx, &params).await.unwrap());
    }

    #[tokio::test]
    async fn keyword_is_a_substring_match() {
        let ctx = ctx();
        let hit = Params::new().with("keywords", json!(["anniversary", "cake"]));
        let miss = Params::new().with("keywords", json!(["anniversary", "flowers"]));
        let empty = Params::new().with("keywords", json!([]));

        assert!(KeywordPresent.evaluate(&ctx, &hit).await.unwrap());
        assert!(!KeywordPresent.evaluate(&ctx, &miss).await.unwrap());
        assert!(!KeywordPresent.evaluate(&ctx, &empty).await.unwrap());
    }

    #[tokio::test]
    async fn empty_keyword_matches_any_text() {
        let mut ctx = ctx();
        let params = Params::new().with("keywords", json!([""]));
        assert!(KeywordPresent.evaluate(&ctx, &params).await.unwrap());

        ctx.booking.option_text.clear();
        assert!(KeywordPresent.evaluate(&ctx, &params).await.unwrap());
    }

    #[tokio::test]
    async fn keywords_with_wrong_shape_error() {
        let ctx = ctx();
        let params = Params::new().with("keywords", "cake");
        assert!(matches!(
            KeywordPresent.evaluate(&ctx, &params).await,
            Err(ConditionError::Param(_))
        ));
    }

    #[tokio::test]
    async fn store_membership() {
        let ctx = ctx();
        let params = Params::new().with("ids", json!(["store-02", "store-01"]));
        assert!(StoreIn.evaluate(&ctx, &params).await.unwrap());
        let params = Params::new().with("ids", json!(["store-02"]));
        assert!(!StoreIn.evaluate(&ctx, &params).await.unwrap());
    }

    #[test]
    fn empty_keyword_is_rejected_at_load() {
        let templates = TemplateCatalog::new();
        let renderer = TemplateRenderer::new();
        let scope = CheckScope { templates: &templates, renderer: &renderer };
        let params = Params::new().with("keywords", json!(["cake", ""]));
        assert!(KeywordPresent.check(&params, &scope).is_err());
    }
}
