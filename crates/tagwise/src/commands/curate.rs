use super::{load_config, load_statistics};
use std::path::Path;
use tagwise_core::{format_tag_line, CurationConfig, TagCurator, TagStatistics};
use tagwise_telemetry::estimate_tokens;

pub fn run(
    config: Option<&Path>,
    stats_path: &Path,
    text: &str,
    max_tags: Option<usize>,
    budget: Option<usize>,
) -> anyhow::Result<()> {
    let mut curation = load_config(config)?.curation;
    if let Some(max_tags) = max_tags {
        curation.max_tags = max_tags;
    }
    if let Some(budget) = budget {
        curation.token_budget = budget;
    }

    let stats = load_statistics(stats_path)?;
    if stats.tainted {
        tracing::warn!(path = %stats_path.display(), "tag statistics are marked stale");
    }
    print!("{}", render(&curation, &stats, text));
    Ok(())
}

fn render(curation: &CurationConfig, stats: &TagStatistics, text: &str) -> String {
    let curator = TagCurator::new(curation.clone());
    let selected = curator.select(&stats.tags, text);
    if selected.is_empty() {
        return "No tags selected.\n".to_string();
    }

    let mut out = format!("Selected Tags ({} of {})\n", selected.len(), stats.tags.len());
    out.push_str("======================\n");
    let mut tokens = 0;
    for tag in &selected {
        if let Some(usage) = stats.get(tag) {
            let line = format_tag_line(tag, usage);
            tokens += estimate_tokens(&line);
            out.push_str(&format!(
                "{}  score:{:.1}\n",
                line,
                curator.score(tag, usage, text)
            ));
        }
    }
    out.push_str(&format!(
        "\n~{} of {} tokens used\n",
        tokens, curation.token_budget
    ));
    out
}
