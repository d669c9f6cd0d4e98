//! HTML bodies for outbound email.

use crate::model::AlertEvent;

const ACCENT: &str = "#6366f1";
const URGENT: &str = "#d9534f";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Wraps `body` (already HTML) in the campus letterhead.
fn layout(title: &str, body: &str, urgent: bool) -> String {
    let header = if urgent { URGENT } else { ACCENT };
    format!(
        r#"<div style="font-family: 'Segoe UI', Tahoma, sans-serif; max-width: 600px; margin: 0 auto; border: 1px solid #e2e8f0; border-radius: 12px; overflow: hidden;">
  <div style="background-color: {header}; padding: 30px; text-align: center; color: white;">
    <h1 style="margin: 0; font-size: 26px;">Campus Zone</h1>
    <p style="margin: 5px 0 0; font-size: 14px;">{title}</p>
  </div>
  <div style="padding: 30px; background-color: #ffffff; color: #333333; line-height: 1.6; font-size: 15px;">
    {body}
  </div>
  <div style="background-color: #f8f9fa; padding: 20px; text-align: center; font-size: 12px; color: #888888;">
    <p>This is an automated notification. Please do not reply.</p>
  </div>
</div>"#,
        title = escape(title),
    )
}

pub fn notice_subject(title: &str) -> String {
    format!("Notice: {title}")
}

pub fn notice_html(title: &str, message: &str) -> String {
    let body = format!(r#"<p style="font-size: 16px;">{}</p>"#, escape(message));
    layout(title, &body, false)
}

pub const ALERT_SUBJECT: &str = "URGENT: Emergency SOS on Bus";

pub fn map_link(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps?q={lat},{lng}")
}

pub fn alert_html(alert: &AlertEvent) -> String {
    let body = format!(
        r#"<div style="border: 2px solid {URGENT}; padding: 20px; border-radius: 10px;">
  <h2 style="color: {URGENT}; margin-top: 0;">Emergency Reported</h2>
  <p><strong>Bus driver:</strong> {driver}</p>
  <p><strong>Reason:</strong> {reason}</p>
  <p>An SOS alert has been triggered for your bus route. Please stay calm and follow emergency protocols.</p>
  <p style="text-align: center;"><a href="{link}">View live bus location</a></p>
</div>"#,
        driver = escape(&alert.driver_id),
        reason = escape(&alert.message),
        link = map_link(alert.lat, alert.lng),
    );
    layout("SOS EMERGENCY ALERT", &body, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::AlertKind;

    #[test]
    fn test_notice_body_is_escaped() {
        let html = notice_html("Fees <due>", "Pay by Friday & Monday");
        assert!(html.contains("Fees &lt;due&gt;"));
        assert!(html.contains("Pay by Friday &amp; Monday"));
        assert!(html.contains(ACCENT));
    }

    #[test]
    fn test_alert_body_uses_urgent_header_and_map_link() {
        let alert = AlertEvent {
            driver_id: "D9".to_string(),
            kind: AlertKind::Emergency,
            message: "Engine fire".to_string(),
            lat: 1.0,
            lng: 2.0,
            timestamp: 0,
        };
        let html = alert_html(&alert);
        assert!(html.contains(URGENT));
        assert!(html.contains("Engine fire"));
        assert!(html.contains("https://www.google.com/maps?q=1,2"));
    }
}
