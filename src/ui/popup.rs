/// Popup UI: active, closed and focused time per site, visit counts and stats

use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use yew::prelude::*;

use crate::config::Config;
use crate::report::{breakdown, format_duration, rank_by_time, rank_visits, stats, top_focused, visit_label};
use crate::snapshot::Snapshot;
use crate::ui::components::{Footer, Section, ShareBar, SiteRow};
use crate::ui::{ViewState, open_dashboard, use_tracker_view};

#[function_component(App)]
pub fn app() -> Html {
    let view = use_tracker_view();

    let on_open_dashboard = Callback::from(|_: MouseEvent| open_dashboard());

    html! {
        <div class="popup-container">
            <h1>{"Browser Activity Tracker"}</h1>

            {match &*view {
                ViewState::Loading => html! {
                    <Spinner />
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Ready { snapshot, config } => render_snapshot(snapshot, config),
            }}

            <Button onclick={on_open_dashboard} variant={ButtonVariant::Secondary} block={true}>
                {"Go to Dashboard"}
            </Button>

            <Footer />
        </div>
    }
}

fn render_snapshot(snapshot: &Snapshot, config: &Config) -> Html {
    let active = rank_by_time(&snapshot.site_data);
    let closed = rank_by_time(&snapshot.closed_tabs);
    let visits = rank_visits(&snapshot.visit_count);
    let focused = top_focused(snapshot, config.popup_top_focused);
    let shares = breakdown(&active);
    let stats = stats(snapshot);

    html! {
        <>
            <Section title={"Active Websites"} is_empty={active.is_empty()} empty_message={"No open websites yet."}>
                {for active.iter().map(|site| html! {
                    <SiteRow hostname={site.hostname.clone()} value={format_duration(site.time)} />
                })}
            </Section>

            <Section title={"Most Focused"} is_empty={focused.is_empty()} empty_message={"Nothing focused yet."}>
                {for focused.iter().map(|site| html! {
                    <SiteRow hostname={site.hostname.clone()} value={format_duration(site.time)} />
                })}
            </Section>

            <Section title={"Visit Count"} is_empty={visits.is_empty()}>
                {for visits.iter().map(|(hostname, count)| html! {
                    <SiteRow hostname={hostname.clone()} value={visit_label(*count)} />
                })}
            </Section>

            if !closed.is_empty() {
                <Section title={"Closed Websites"}>
                    {for closed.iter().map(|site| html! {
                        <SiteRow hostname={site.hostname.clone()} value={format_duration(site.time)} />
                    })}
                </Section>
            }

            <Section title={"Time Breakdown"} is_empty={shares.is_empty()} empty_message={"No data to show in chart."}>
                {for shares.iter().enumerate().map(|(i, share)| html! {
                    <ShareBar label={share.hostname.clone()} percent={share.percent} color_index={i} />
                })}
            </Section>

            <Section title={"Stats"}>
                <div class="stat-row">
                    <span>{"Websites Visited:"}</span>
                    <span>{stats.websites_visited}</span>
                </div>
                <div class="stat-row">
                    <span>{"Active Websites:"}</span>
                    <span>{stats.active_websites}</span>
                </div>
            </Section>
        </>
    }
}
