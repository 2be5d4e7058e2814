// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// HTML rendering of the collected changelog.
///
/// Entries are pre-rendered fragments. They, the document title, version
/// labels and logins are all inserted verbatim, with no escaping.
use tracing::debug;

use crate::{Aggregator, Tally};

const DOCTYPE: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\" \
                       \"http://www.w3.org/TR/html4/loose.dtd\">";
const LOG_HEADING: &str =
    "The following pull requests made by community contributors were merged:";

/// Renders the changelog document for `versions`, in the given order.
///
/// Versions without collected data still get a complete, empty section.
///
/// # Examples
///
/// ```
/// use prlog::{Aggregator, render_document};
///
/// let html = render_document("Log", &["1.0".to_owned()], &Aggregator::new(),);
/// assert!(html.contains("<h1>1.0</h1>"));
/// assert!(html.contains("<h4>0 pull requests.</h4>"));
/// ```
pub fn render_document(title: &str, versions: &[String], aggregator: &Aggregator,) -> String
{
    let mut html = String::from(DOCTYPE,);
    html.push_str("\n<html>\n<head>",);
    html.push_str("\n<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">",);
    html.push_str(&format!("\n<title>{title}</title>"),);
    html.push_str("\n</head>\n<body>",);

    for version in versions {
        if !aggregator.contains(version,) {
            debug!("Version {} has no collected pulls", version);
        }
        html.push_str(&render_version(version, aggregator,),);
    }

    html.push_str("\n</body>\n</html>\n",);
    html
}

fn render_version(version: &str, aggregator: &Aggregator,) -> String
{
    let bucket = aggregator.bucket(version,);
    let mut html = format!("\n<h1>{version}</h1>");

    for (label, entries,) in bucket.labelled.iter() {
        html.push_str(&format!("\n<h2>{label}</h2>\n<ul>"),);
        for entry in entries {
            html.push_str(&format!("\n<li>{entry}</li>"),);
        }
        html.push_str("\n</ul>",);
    }

    html.push_str(&format!("\n<h2>{LOG_HEADING}</h2>\n<ol>"),);
    for entry in &bucket.log {
        html.push_str(&format!("\n<li>{entry}</li>"),);
    }
    html.push_str("\n</ol>",);

    html.push_str(&format!("\n<h4>{} pull requests.</h4>", bucket.pull_count()),);
    html.push_str(&render_leaderboard(&bucket.user_counts,),);

    html.push_str("\n<h4>Merged by:</h4>",);
    html.push_str(&render_leaderboard(&bucket.merged_by,),);

    html
}

fn render_leaderboard(tally: &Tally,) -> String
{
    let mut html = String::from("\n<ol>",);
    for (login, count,) in tally.ranked() {
        html.push_str(&format!("\n<li>{login}: {count}</li>"),);
    }
    html.push_str("\n</ol>",);
    html
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{BufferKey, BufferKind, BufferValue, LabelGroups};

    fn tally(logins: &[&str],) -> Tally
    {
        let mut tally = Tally::default();
        for login in logins {
            tally.increment(login,);
        }
        tally
    }

    fn populated() -> Aggregator
    {
        let mut aggregator = Aggregator::new();
        for entry in ["<b>first</b>", "second"] {
            aggregator.set_buffer(
                &BufferKey::new("2.0", BufferKind::Log,),
                BufferValue::Entry(entry.to_owned(),),
                true,
            );
        }

        let mut groups = LabelGroups::default();
        groups.push("bug", "<a href=\"u1\">first</a>".to_owned(),);
        aggregator.set_buffer(
            &BufferKey::new("2.0", BufferKind::Labelled,),
            BufferValue::Labelled(groups,),
            false,
        );
        aggregator.set_buffer(
            &BufferKey::new("2.0", BufferKind::UserCount,),
            BufferValue::Counts(tally(&["a", "a", "a", "b", "b", "b", "c", "c", "c", "c", "c",],),),
            false,
        );
        aggregator.set_buffer(
            &BufferKey::new("2.0", BufferKind::MergedBy,),
            BufferValue::Counts(tally(&["m", "n", "n",],),),
            false,
        );
        aggregator
    }

    #[test]
    fn renders_sections_in_expected_order()
    {
        let html = render_document("Widgets log", &["2.0".to_owned()], &populated(),);

        let expected = "\n<h1>2.0</h1>\n<h2>bug</h2>\n<ul>\n<li><a href=\"u1\">first</a></li>\n</ul>\n<h2>The \
                        following pull requests made by community contributors were \
                        merged:</h2>\n<ol>\n<li><b>first</b></li>\n<li>second</li>\n</ol>\n<h4>2 \
                        pull requests.</h4>\n<ol>\n<li>c: 5</li>\n<li>a: 3</li>\n<li>b: \
                        3</li>\n</ol>\n<h4>Merged by:</h4>\n<ol>\n<li>n: 2</li>\n<li>m: \
                        1</li>\n</ol>";
        assert!(html.contains(expected), "unexpected document:\n{html}");
        assert!(html.contains("<title>Widgets log</title>"));
        assert!(html.starts_with("<!DOCTYPE html"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn empty_bucket_renders_complete_section()
    {
        let html = render_document("Log", &["9.9".to_owned()], &Aggregator::new(),);

        assert!(html.contains(
            "<h1>9.9</h1>\n<h2>The following pull requests made by community contributors were \
             merged:</h2>\n<ol>\n</ol>\n<h4>0 pull requests.</h4>\n<ol>\n</ol>\n<h4>Merged \
             by:</h4>\n<ol>\n</ol>"
        ));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn versions_render_in_given_order()
    {
        let html =
            render_document("Log", &["3.0".to_owned(), "2.0".to_owned(), "1.0".to_owned()], &populated(),);

        let positions: Vec<usize,> = ["<h1>3.0</h1>", "<h1>2.0</h1>", "<h1>1.0</h1>"]
            .iter()
            .map(|heading| html.find(heading,).expect("heading rendered",),)
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn values_are_inserted_verbatim()
    {
        let mut aggregator = Aggregator::new();
        aggregator.set_buffer(
            &BufferKey::new("1.0 <beta>", BufferKind::UserCount,),
            BufferValue::Counts(tally(&["<odd>",],),),
            false,
        );
        aggregator.set_buffer(
            &BufferKey::new("1.0 <beta>", BufferKind::Log,),
            BufferValue::Entry("<em>raw</em>".to_owned(),),
            true,
        );
        let mut groups = LabelGroups::default();
        groups.push("docs & <i>site</i>", "entry".to_owned(),);
        aggregator.set_buffer(
            &BufferKey::new("1.0 <beta>", BufferKind::Labelled,),
            BufferValue::Labelled(groups,),
            false,
        );

        let html = render_document("A & B", &["1.0 <beta>".to_owned()], &aggregator,);

        assert!(html.contains("<title>A & B</title>"));
        assert!(html.contains("<h1>1.0 <beta></h1>"));
        assert!(html.contains("<h2>docs & <i>site</i></h2>"));
        assert!(html.contains("<li><odd>: 1</li>"));
        assert!(html.contains("<li><em>raw</em></li>"));
    }
}
