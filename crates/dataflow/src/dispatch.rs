//! Newsletter composition and delivery.

use askama::Template;
use broadcaster::Broadcaster;
use entsoe_client::region_name;
use mailer::Email;
use tracing::{info, instrument};

use crate::directory::User;
use crate::error::DispatchError;
use crate::report::{TableHtml, UtilizationReport};

/// A recipient whose newsletter was not delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecipient {
    pub recipient: String,
    pub reason: String,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: Vec<String>,
    pub failed: Vec<FailedRecipient>,
}

impl DispatchSummary {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Headline shared by subject and body.
pub fn headline(report: &UtilizationReport, region_name: &str) -> String {
    format!("Intraday Generation Forecasts {} ({})", report.title, region_name)
}

/// Newsletter body template.
#[derive(Template)]
#[template(path = "newsletter.html")]
struct NewsletterHtml<'a> {
    name: &'a str,
    headline: &'a str,
    chart: &'a [String],
    table: TableHtml,
}

/// Build the newsletter for one user.
pub fn compose_email(
    user: &User,
    report: &UtilizationReport,
    region_name: &str,
) -> Result<Email, DispatchError> {
    let headline = headline(report, region_name);

    let html = NewsletterHtml {
        name: &user.name,
        headline: &headline,
        chart: &report.chart,
        table: report.table.html(),
    }
    .render()?;
    let text = format!("Hello {},\n\n{}:\n\n{}\n", user.name, headline, report.chart_text());

    Ok(Email::new(&user.email, format!("Newsletter: {}", headline), text).with_html(html))
}

/// Sends a report to every user.
#[derive(Clone)]
pub struct Dispatcher {
    broadcaster: Broadcaster,
}

impl Dispatcher {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }

    /// Send `report` for `region` to all `users`.
    ///
    /// Individual failures end up in the summary. The call only fails when
    /// there was someone to send to and nobody received the newsletter.
    #[instrument(skip(self, report, users), fields(users = users.len()))]
    pub async fn dispatch(
        &self,
        report: &UtilizationReport,
        region: &str,
        users: &[User],
    ) -> Result<DispatchSummary, DispatchError> {
        let region_name = region_name(region);
        let emails = users
            .iter()
            .map(|user| compose_email(user, report, &region_name))
            .collect::<Result<Vec<_>, _>>()?;

        let outcome = self.broadcaster.broadcast(emails).await;
        if outcome.all_failed() {
            return Err(DispatchError::AllFailed {
                attempted: outcome.attempted(),
            });
        }

        let summary = DispatchSummary {
            delivered: outcome.delivered,
            failed: outcome
                .failed
                .into_iter()
                .map(|failure| FailedRecipient {
                    recipient: failure.recipient,
                    reason: failure.error.to_string(),
                })
                .collect(),
        };
        info!(
            region = %region_name,
            delivered = summary.delivered.len(),
            failed = summary.failed.len(),
            "Newsletter dispatched"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use entsoe_client::{ColumnKey, GenerationSeries, InstalledCapacity};
    use mailer::{MailError, MailTransport};

    use crate::report::{build_report, ReportTable};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Email>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            if self.reject.contains(&email.recipients()) {
                return Err(MailError::Send("rejected".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn report() -> UtilizationReport {
        UtilizationReport {
            title: "Wind Offshore".to_string(),
            chart: vec!["line <1>".to_string(), "line 2".to_string()],
            table: ReportTable::Joined(Vec::new()),
        }
    }

    #[test]
    fn test_compose_email() {
        let user = User::new("Ada <script>", "ada@example.org");
        let email = compose_email(&user, &report(), "Germany-Luxembourg").unwrap();

        assert_eq!(email.to, vec!["ada@example.org".to_string()]);
        assert_eq!(
            email.subject,
            "Newsletter: Intraday Generation Forecasts Wind Offshore (Germany-Luxembourg)"
        );

        let html = email.html_body.unwrap();
        assert!(html.starts_with("Hello Ada &lt;script&gt;, <br>Please find our latest update on: <br><br>"));
        assert!(html.contains("<h1>Intraday Generation Forecasts Wind Offshore (Germany-Luxembourg):</h1>"));
        assert!(html.contains("line &lt;1&gt;<br>line 2<br><br><table"));
        assert!(html.trim_end().ends_with("</table>"));
        assert!(!html.contains("<script>"));

        assert_eq!(
            email.body,
            "Hello Ada <script>,\n\nIntraday Generation Forecasts Wind Offshore (Germany-Luxembourg):\n\nline <1>\nline 2\n"
        );
    }

    #[test]
    fn test_compose_email_with_joined_rows() {
        let capacity: InstalledCapacity = [("Wind Offshore", vec![8465.0])].into_iter().collect();
        let generation = GenerationSeries::from_points([(
            ColumnKey::composite("Wind Offshore", "Actual Aggregated"),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            4232.0,
        )]);
        let report = build_report(generation, &capacity);
        let email = compose_email(&User::new("Ada", "ada@example.org"), &report, "Germany-Luxembourg").unwrap();

        let html = email.html_body.unwrap();
        assert!(html.contains(":</h1>2024-03-01 00:00:00+00:00 | "));
        assert!(html.contains("=&gt; 50% (4232MW/8465MW)<br><br><table"));
        assert!(html.contains("<td>4232</td>"));
    }

    #[tokio::test]
    async fn test_dispatch_sends_one_email_per_user() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(Broadcaster::new(transport.clone()));
        let users = vec![User::new("A", "a@example.org"), User::new("B", "b@example.org")];

        let summary = dispatcher.dispatch(&report(), "10YBE----------2", &users).await.unwrap();

        assert_eq!(summary.delivered.len(), 2);
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|e| e.subject.ends_with("(Belgium)")));
    }

    #[tokio::test]
    async fn test_single_failure_does_not_fail_dispatch() {
        let transport = Arc::new(RecordingTransport {
            reject: vec!["b@example.org".to_string()],
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(Broadcaster::new(transport.clone()));
        let users = vec![User::new("A", "a@example.org"), User::new("B", "b@example.org")];

        let summary = dispatcher.dispatch(&report(), "", &users).await.unwrap();

        assert_eq!(summary.delivered, vec!["a@example.org".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].recipient, "b@example.org");
    }

    #[tokio::test]
    async fn test_all_failed_is_an_error() {
        let transport = Arc::new(RecordingTransport {
            reject: vec!["a@example.org".to_string()],
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(Broadcaster::new(transport));
        let users = vec![User::new("A", "a@example.org")];

        let result = dispatcher.dispatch(&report(), "", &users).await;
        assert!(matches!(result, Err(DispatchError::AllFailed { attempted: 1 })));
    }

    #[tokio::test]
    async fn test_no_users_is_not_an_error() {
        let dispatcher = Dispatcher::new(Broadcaster::new(Arc::new(RecordingTransport::default())));
        let summary = dispatcher.dispatch(&report(), "", &[]).await.unwrap();
        assert_eq!(summary.attempted(), 0);
    }

    #[test]
    fn test_degraded_report_email_carries_raw_table() {
        let report = build_report(GenerationSeries::new(), &InstalledCapacity::empty());
        let email = compose_email(&User::new("A", "a@example.org"), &report, "unknown region").unwrap();
        let html = email.html_body.unwrap();
        assert!(html.contains("capacity for unknown generation not available<br>the raw subscription data follows below"));
    }
}
