/// Dashboard page: time per category, most visited sites, categorized site lists

use patternfly_yew::prelude::{Alert, AlertType, Spinner};
use yew::prelude::*;

use crate::config::Config;
use crate::report::{CategoryTotal, categorize, format_minutes, rank_visits};
use crate::snapshot::Snapshot;
use crate::ui::components::{Footer, Section, ShareBar};
use crate::ui::{ViewState, use_tracker_view};

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let view = use_tracker_view();

    html! {
        <div class="dashboard-container">
            <h1>{"Website Usage Summary"}</h1>

            {match &*view {
                ViewState::Loading => html! {
                    <Spinner />
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Ready { snapshot, config } => render_summary(snapshot, config),
            }}

            <Footer />
        </div>
    }
}

fn render_summary(snapshot: &Snapshot, config: &Config) -> Html {
    let categories = categorize(&snapshot.site_data, &config.categories);
    let visits = rank_visits(&snapshot.visit_count);
    // Bars are scaled against the largest category
    let max_total = categories.iter().map(|c| c.total).max().unwrap_or(0);

    html! {
        <>
            <Section title={"Time Spent by Category"} is_empty={categories.is_empty()} empty_message={"No open websites yet."}>
                {for categories.iter().enumerate().map(|(i, category)| html! {
                    <ShareBar
                        label={category.category.clone()}
                        percent={scaled_percent(category.total, max_total)}
                        caption={Some(format_minutes(category.total))}
                        color_index={i}
                    />
                })}
            </Section>

            <Section title={"Most Visited Websites"} is_empty={visits.is_empty()} empty_message={"No visits recorded."}>
                {for visits.iter().map(|(hostname, count)| html! {
                    <div class="site-item">
                        <span>{hostname}</span>
                        <span>
                            <span class="badge badge-visits">{format!("{}x", count)}</span>
                            <span class="badge badge-time">{format_minutes(snapshot.site_time(hostname))}</span>
                        </span>
                    </div>
                })}
            </Section>

            <Section title={"Categorized Websites"} is_empty={categories.is_empty()}>
                {for categories.iter().map(render_category)}
            </Section>
        </>
    }
}

fn render_category(category: &CategoryTotal) -> Html {
    html! {
        <div class="section">
            <h3>{&category.category}</h3>
            {for category.sites.iter().map(|site| html! {
                <div class="site-item">
                    <span>{&site.hostname}</span>
                    <span class="badge badge-time">{format_minutes(site.time)}</span>
                </div>
            })}
        </div>
    }
}

fn scaled_percent(value: u64, max: u64) -> u8 {
    if max == 0 {
        0
    } else {
        (value * 100 / max) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_percent() {
        assert_eq!(scaled_percent(0, 0), 0);
        assert_eq!(scaled_percent(50, 200), 25);
        assert_eq!(scaled_percent(200, 200), 100);
    }
}
