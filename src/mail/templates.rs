//! Locally rendered HTML / plain-text bodies for the SMTP transport

use super::{Notification, Recipient};

/// Product details shown in the email header and signature
#[derive(Debug, Clone)]
pub struct Branding {
    pub product_name: String,
    pub product_link: String,
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

struct Action<'a> {
    instructions: String,
    button: &'a str,
    link: &'a str,
}

struct Body<'a> {
    intros: Vec<String>,
    table: Vec<(&'static str, &'a str)>,
    action: Option<Action<'a>>,
    outros: Vec<String>,
}

pub fn render(recipient: &Recipient, notification: &Notification, branding: &Branding) -> RenderedEmail {
    let body = compose(notification, branding);
    RenderedEmail {
        html: render_html(recipient, &body, branding),
        text: render_text(recipient, &body, branding),
    }
}

fn compose<'a>(notification: &'a Notification, branding: &'a Branding) -> Body<'a> {
    let product = &branding.product_name;
    match notification {
        Notification::Welcome { confirm_url, .. } => Body {
            intros: vec![format!(
                "Welcome to {}! We're very excited to have you on board.",
                product
            )],
            table: Vec::new(),
            action: web_link(confirm_url).map(|link| Action {
                instructions: format!("To get started with {}, please confirm your account:", product),
                button: "Confirm your account",
                link,
            }),
            outros: vec![
                "Need help, or have questions? Just reply to this email, we'd love to help."
                    .to_string(),
            ],
        },
        Notification::Signal {
            symbol,
            time,
            signal,
            strategy,
        } => Body {
            intros: vec![format!("A new {} signal was triggered for {}.", signal, symbol)],
            table: vec![
                ("Symbol", symbol.as_str()),
                ("Time", time.as_str()),
                ("Signal", signal.as_str()),
                ("Strategy", strategy.as_str()),
            ],
            action: Some(Action {
                instructions: "Review your running tasks:".to_string(),
                button: "Open dashboard",
                link: &branding.product_link,
            }),
            outros: vec![
                "You are receiving this email because you subscribed to signals for this task."
                    .to_string(),
            ],
        },
    }
}

/// `url` if it is an http(s) address, so payload data cannot smuggle a
/// `javascript:` or `data:` link into the button
fn web_link(url: &str) -> Option<&str> {
    let url = url.trim();
    let (scheme, _) = url.split_once(':')?;
    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        Some(url)
    } else {
        None
    }
}

fn render_html(recipient: &Recipient, body: &Body<'_>, branding: &Branding) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head>");
    html.push_str("<body style=\"font-family: Helvetica, Arial, sans-serif; color: #333;\">");
    html.push_str(&format!(
        "<div style=\"text-align: center; padding: 24px;\"><a href=\"{}\" style=\"font-size: 20px; font-weight: bold; color: #2c3e50; text-decoration: none;\">{}</a></div>",
        escape(&branding.product_link),
        escape(&branding.product_name)
    ));
    html.push_str("<div style=\"max-width: 570px; margin: 0 auto; padding: 24px;\">");
    html.push_str(&format!("<h1 style=\"font-size: 19px;\">Hi {},</h1>", escape(&recipient.name)));

    for line in &body.intros {
        html.push_str(&format!("<p>{}</p>", escape(line)));
    }

    if !body.table.is_empty() {
        html.push_str("<table style=\"width: 100%; border-collapse: collapse; margin: 16px 0;\">");
        for (label, value) in &body.table {
            html.push_str(&format!(
                "<tr><td style=\"padding: 6px; border-bottom: 1px solid #eee; font-weight: bold;\">{}</td><td style=\"padding: 6px; border-bottom: 1px solid #eee;\">{}</td></tr>",
                escape(label),
                escape(value)
            ));
        }
        html.push_str("</table>");
    }

    if let Some(action) = &body.action {
        html.push_str(&format!("<p>{}</p>", escape(&action.instructions)));
        html.push_str(&format!(
            "<p style=\"text-align: center;\"><a href=\"{}\" style=\"display: inline-block; padding: 10px 18px; background: #22BC66; color: #fff; border-radius: 3px; text-decoration: none;\">{}</a></p>",
            escape(action.link),
            escape(action.button)
        ));
    }

    for line in &body.outros {
        html.push_str(&format!("<p>{}</p>", escape(line)));
    }

    html.push_str(&format!(
        "<p>Yours truly,<br>{}</p></div></body></html>",
        escape(&branding.product_name)
    ));
    html
}

fn render_text(recipient: &Recipient, body: &Body<'_>, branding: &Branding) -> String {
    let mut lines = vec![format!("Hi {},", recipient.name), String::new()];
    lines.extend(body.intros.iter().cloned());
    if !body.table.is_empty() {
        lines.push(String::new());
        lines.extend(body.table.iter().map(|(label, value)| format!("{}: {}", label, value)));
    }
    if let Some(action) = &body.action {
        lines.push(String::new());
        lines.push(action.instructions.clone());
        lines.push(action.link.to_string());
    }
    lines.push(String::new());
    lines.extend(body.outros.iter().cloned());
    lines.push(String::new());
    lines.push("Yours truly,".to_string());
    lines.push(branding.product_name.clone());
    lines.join("\n")
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
