//! HTML serialization of the visual tree

use super::{DeviceCard, Page, ThingCard, ThingsSection, PAGE_TITLE};

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

impl Page {
    pub fn to_html(&self) -> String {
        let body = match self {
            Page::ErrorBanner(message) => format!(
                r#"<div class="error" style="padding: 1rem; background-color: #fef2f2; color: #ef4444; border-radius: 0.5rem;">{}</div>"#,
                escape(message)
            ),
            Page::Loading => r#"<p style="color: #6b7280;">Loading devices...</p>"#.to_string(),
            Page::DeviceList { title, devices } => {
                let cards: String = devices.iter().map(device_html).collect();
                format!(
                    r#"<h1 style="font-size: 1.5rem; font-weight: 700; margin-bottom: 1.5rem;">{}</h1>
    <div style="display: grid; gap: 1.5rem;">{}</div>"#,
                    escape(title),
                    cards
                )
            }
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
</head>
<body style="font-family: system-ui, sans-serif; background-color: #f9fafb; max-width: 960px; margin: 0 auto; padding: 2rem 1rem;">
    {body}
</body>
</html>"#,
            title = PAGE_TITLE,
            body = body,
        )
    }
}

fn device_html(device: &DeviceCard) -> String {
    let things = match &device.things {
        ThingsSection::Placeholder(text) => format!(
            r#"<p style="font-size: 0.875rem; color: #6b7280; font-style: italic;">{}</p>"#,
            escape(text)
        ),
        ThingsSection::Things(things) => {
            let items: String = things.iter().map(thing_html).collect();
            format!(
                r#"<div style="margin-top: 1rem;">
                <h3 style="font-weight: 500; font-size: 1.125rem; margin-bottom: 0.5rem;">Things</h3>
                <div style="display: grid; gap: 1rem; padding-left: 1rem;">{items}</div>
            </div>"#
            )
        }
    };

    format!(
        r#"<div class="device" style="padding: 1.5rem; border: 1px solid #e5e7eb; border-radius: 0.5rem; background-color: #fff;">
            <div style="display: flex; align-items: center; justify-content: space-between; margin-bottom: 1rem;">
                <h2 style="font-weight: 600; font-size: 1.25rem;">{}</h2>
                <span style="padding: 0.25rem 0.75rem; background-color: #dbeafe; color: #1e40af; border-radius: 9999px; font-size: 0.875rem;">{}</span>
            </div>
            {}
        </div>"#,
        escape(&device.name),
        escape(&device.id_badge),
        things
    )
}

fn thing_html(thing: &ThingCard) -> String {
    let properties = if thing.properties.is_empty() {
        String::new()
    } else {
        let items: String = thing
            .properties
            .iter()
            .map(|p| {
                let value = p
                    .value
                    .as_ref()
                    .map(|v| format!(r#"<span style="margin-left: 0.5rem; color: #2563eb;">= {}</span>"#, escape(v)))
                    .unwrap_or_default();
                format!(
                    r#"<li style="font-size: 0.875rem; color: #4b5563;">{} ({}){}</li>"#,
                    escape(&p.name),
                    escape(&p.property_type),
                    value
                )
            })
            .collect();
        format!(
            r#"<div style="margin-top: 0.5rem;">
                    <p style="font-size: 0.875rem; font-weight: 500;">Properties:</p>
                    <ul style="list-style: disc inside; padding-left: 0.5rem;">{items}</ul>
                </div>"#
        )
    };

    format!(
        r#"<div class="thing" style="border-left: 2px solid #bfdbfe; padding-left: 1rem;">
                    <h4 style="font-weight: 500;">{}</h4>
                    <p style="font-size: 0.875rem; color: #6b7280;">Created: {}</p>
                    {}
                </div>"#,
        escape(&thing.name),
        escape(&thing.created),
        properties
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{PropertyLine, NO_THINGS_PLACEHOLDER};

    fn card(things: ThingsSection) -> DeviceCard {
        DeviceCard {
            name: "Greenhouse".to_string(),
            id_badge: "Device ID: d1".to_string(),
            things,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_error_banner_html_has_no_device_markup() {
        let html = Page::ErrorBanner("Error fetching <devices>".to_string()).to_html();

        assert!(html.contains("Error fetching &lt;devices&gt;"));
        assert!(!html.contains(r#"class="device""#));
    }

    #[test]
    fn test_device_list_html() {
        let page = Page::DeviceList {
            title: PAGE_TITLE.to_string(),
            devices: vec![
                card(ThingsSection::Placeholder(NO_THINGS_PLACEHOLDER.to_string())),
                card(ThingsSection::Things(vec![ThingCard {
                    name: "Weather".to_string(),
                    created: "3/5/2024".to_string(),
                    properties: vec![
                        PropertyLine {
                            name: "temperature".to_string(),
                            property_type: "FLOAT".to_string(),
                            value: Some("0".to_string()),
                        },
                        PropertyLine {
                            name: "label".to_string(),
                            property_type: "STRING".to_string(),
                            value: None,
                        },
                    ],
                }])),
            ],
        };

        let html = page.to_html();

        assert!(html.contains(PAGE_TITLE));
        assert!(html.contains(NO_THINGS_PLACEHOLDER));
        assert!(html.contains("Device ID: d1"));
        assert!(html.contains("Created: 3/5/2024"));
        assert!(html.contains("temperature (FLOAT)"));
        assert!(html.contains("= 0</span>"));
        assert!(html.contains("label (STRING)</li>"));
        assert_eq!(html.matches(r#"class="device""#).count(), 2);
    }
}
