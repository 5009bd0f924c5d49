//! Render a catalog template and hand it to the channel's sender.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bookwatch_core::mask_phone;
use bookwatch_notify::{Channel, OutboundMessage};
use serde_json::{json, Value};

use crate::context::BookingContext;
use crate::error::{ActionError, ParamError, RenderError};
use crate::registry::{Action, ActionEnv, CheckScope, ParamKind, ParamSpec, Params};
use crate::render::is_reference;

/// Target resolved to the booking's phone number.
const TARGET_CUSTOMER: &str = "customer";
/// Target resolved to the store profile's `chat_target`.
const TARGET_STORE: &str = "store";

/// Send a templated message.
///
/// Parameters: `channel` (`sms` or `chat`), `template` (name in the
/// document's catalog) and `target`. The target is `customer`, `store`, or a
/// literal address; it defaults to `customer` for SMS and `store` for chat.
/// Success means the sender accepted the message, not that it was delivered.
pub struct SendMessage;

const MESSAGE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("channel", ParamKind::Str),
    ParamSpec::required("template", ParamKind::Str),
    ParamSpec::optional("target", ParamKind::Str),
];

fn parse_channel(params: &Params) -> Result<Channel, ActionError> {
    let raw = params.str("channel")?;
    Channel::parse(raw).ok_or_else(|| {
        ActionError::Param(ParamError::Shape {
            name: "channel".to_string(),
            expected: "'sms' or 'chat'",
        })
    })
}

fn resolve_target(
    ctx: &BookingContext,
    env: &ActionEnv<'_>,
    channel: Channel,
    target: Option<&str>,
) -> Result<String, ActionError> {
    let target = target.unwrap_or(match channel {
        Channel::Sms => TARGET_CUSTOMER,
        Channel::Chat => TARGET_STORE,
    });
    match target {
        TARGET_CUSTOMER => ctx
            .booking
            .phone
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ActionError::MissingTarget(format!("booking {} has no phone", ctx.identity()))),
        TARGET_STORE => env
            .store
            .and_then(|s| s.chat_target.clone())
            .ok_or_else(|| {
                ActionError::MissingTarget(format!(
                    "store '{}' has no chat_target",
                    ctx.booking.id.store_id
                ))
            }),
        literal if literal.trim().is_empty() => {
            Err(ActionError::MissingTarget("empty target".to_string()))
        }
        literal => Ok(literal.to_string()),
    }
}

#[async_trait]
impl Action for SendMessage {
    fn name(&self) -> &'static str {
        "send-message"
    }

    fn params(&self) -> &'static [ParamSpec] {
        MESSAGE_PARAMS
    }

    fn check(&self, params: &Params, scope: &CheckScope<'_>) -> Result<(), String> {
        if let Some(channel) = params.get("channel").filter(|v| !is_reference(v)) {
            let name = channel.as_str().unwrap_or_default();
            if Channel::parse(name).is_none() {
                return Err(format!("unknown channel '{name}', expected 'sms' or 'chat'"));
            }
        }
        if let Some(template) = params.get("template").filter(|v| !is_reference(v)) {
            let name = template.as_str().unwrap_or_default();
            if !scope.templates.contains_key(name) {
                return Err(format!("unknown message template '{name}'"));
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &mut BookingContext,
        params: &Params,
        env: &ActionEnv<'_>,
    ) -> Result<Value, ActionError> {
        let channel = parse_channel(params)?;
        let template_name = params.str("template")?;
        let template = env
            .templates
            .get(template_name)
            .ok_or_else(|| ActionError::UnknownTemplate(template_name.to_string()))?;

        let target = resolve_target(ctx, env, channel, params.opt_str("target")?)?;
        let body = env
            .renderer
            .render(template.body_for(&ctx.booking.id.store_id), &ctx.view(env.store))
            .map_err(|e| RenderError::Template(e.to_string()))?;

        let metadata = BTreeMap::from([
            ("template".to_string(), template_name.to_string()),
            ("booking".to_string(), ctx.identity().to_string()),
            ("rule".to_string(), env.rule_name.to_string()),
        ]);
        let message = OutboundMessage {
            channel,
            target,
            body,
            metadata,
        };
        let receipt = ctx.services.dispatcher.dispatch(&message).await?;

        let shown_target = match channel {
            Channel::Sms => mask_phone(&message.target),
            Channel::Chat => message.target.clone(),
        };
        Ok(json!({
            "channel": channel.as_str(),
            "template": template_name,
            "target": shown_target,
            "message_id": receipt.message_id,
        }))
    }
}
