/// Reusable UI components

use yew::prelude::*;

/// Palette the breakdown bars cycle through
pub const PALETTE: [&str; 7] = [
    "#ff6384", "#36a2eb", "#ffce56", "#4bc0c0", "#9966ff", "#ff9f40", "#e7e9ed",
];

#[derive(Properties, PartialEq)]
pub struct ShareBarProps {
    pub label: String,
    pub percent: u8, // 0-100
    #[prop_or_default]
    pub caption: Option<String>,
    #[prop_or(0)]
    pub color_index: usize,
}

#[function_component(ShareBar)]
pub fn share_bar(props: &ShareBarProps) -> Html {
    let percent = props.percent.min(100);
    let color = PALETTE[props.color_index % PALETTE.len()];
    let caption = props.caption.clone().unwrap_or_else(|| format!("{}%", percent));

    html! {
        <div class="share-bar">
            <span class="share-bar-label" title={props.label.clone()}>{&props.label}</span>
            <div class="share-bar-track">
                <div class="share-bar-fill" style={format!("width: {}%; background-color: {};", percent, color)}></div>
            </div>
            <span>{caption}</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SiteRowProps {
    pub hostname: String,
    pub value: String,
}

#[function_component(SiteRow)]
pub fn site_row(props: &SiteRowProps) -> Html {
    html! {
        <div class="site-item">
            <span>{&props.hostname}</span>
            <span>{&props.value}</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SectionProps {
    pub title: String,
    pub children: Children,
    #[prop_or_default]
    pub empty_message: String,
    #[prop_or(false)]
    pub is_empty: bool,
}

#[function_component(Section)]
pub fn section(props: &SectionProps) -> Html {
    html! {
        <section class="section">
            <h2>{&props.title}</h2>
            if props.is_empty {
                if !props.empty_message.is_empty() {
                    <p>{&props.empty_message}</p>
                }
            } else {
                {props.children.clone()}
            }
        </section>
    }
}

#[function_component(Footer)]
pub fn footer() -> Html {
    html! {
        <p class="footer">{"Site Time Tracker v0.1.0"}</p>
    }
}
