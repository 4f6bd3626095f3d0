//! Data analysis over the last uploaded dataset.
//!
//! Questions that match a keyword query are computed locally and the result
//! is summarised by the model. Anything else goes to the model with the
//! dataset rendered as a Markdown table. The remaining functions back the
//! `/info`, `/dedupe`, `/fill`, `/outliers`, `/corr`, `/export` and
//! `/profile` console commands.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dataset::{self, Fill, Table, query, stats};
use crate::error::InteractionError;
use crate::llm::LlmRequest;
use crate::session::{LoadedDataset, Section, SessionContext};

use super::{Ask, AgentsState, ChatCore};

pub const CAPABILITIES: &str = "**Current Capabilities:**

1.  **Data Queries (AI Assistant):** Ask me anything in natural language about your dataset.
2.  **Data Cleaning Assistant:** `/dedupe` removes duplicate rows, `/fill <column> static <value>|mean|median` fills missing values, `/export [path]` saves the cleaned data as CSV.
3.  **Outlier Detection:** `/outliers <column>` finds outliers in a numerical column (IQR method).
4.  **Correlation Matrix:** `/corr` shows the correlation between numerical columns.
5.  **Automatic Data Profiling:** `/profile [path]` generates a full EDA report.";

const PREVIEW_ROWS: usize = 5;

pub fn loaded_message(name: &str, table: &Table) -> String {
    format!(
        "Successfully loaded `{name}`. The dataset has **{} rows** and **{} columns**.",
        table.n_rows(),
        table.n_cols()
    )
}

fn current(session: &SessionContext) -> Result<&LoadedDataset, InteractionError> {
    session.dataset.as_ref().ok_or(InteractionError::NoDataset)
}

fn current_mut(session: &mut SessionContext) -> Result<&mut LoadedDataset, InteractionError> {
    session.dataset.as_mut().ok_or(InteractionError::NoDataset)
}

/// Load `path` and make it the current dataset. The data transcript restarts
/// with the load summary and the capability list.
pub async fn upload(
    _state: &AgentsState,
    session: &mut SessionContext,
    path: &Path,
) -> Result<String, InteractionError> {
    let owned = path.to_path_buf();
    let table = tokio::task::spawn_blocking(move || dataset::load_table(&owned))
        .await
        .map_err(|e| InteractionError::Io(std::io::Error::other(e)))?
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "dataset upload failed"))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let message = loaded_message(&name, &table);
    info!(dataset = %name, rows = table.n_rows(), cols = table.n_cols(), "dataset loaded");

    session.data.restart_with([message.clone(), CAPABILITIES.to_string()]);
    session.dataset = Some(LoadedDataset { name, table });
    Ok(format!("{message}\n\n{CAPABILITIES}"))
}

pub async fn ask(
    state: &AgentsState,
    session: &mut SessionContext,
    input: &str,
    on_fragment: &mut dyn FnMut(&str),
) -> Result<String, InteractionError> {
    let question = ChatCore::require_input(input)?;
    let table = &current(session)?.table;

    let prompt = match query::run_query(table, question) {
        Some(query::QueryMatch { key, result: Ok(result) }) => {
            info!(query = key, "keyword query matched");
            state.prompts.data_summary(&result)
        }
        Some(query::QueryMatch { key, result: Err(e) }) => {
            warn!(query = key, error = %e, "keyword query failed");
            let reply = format!(
                "An error occurred while trying to fulfill your request: {e}. Please check your dataset columns."
            );
            return Ok(ChatCore::record_local_reply(session, Section::Data, question, reply, on_fragment));
        }
        None => {
            let context = table.to_markdown(state.max_context_rows);
            state.prompts.data_analyst(&context, question)
        }
    };

    let ask = Ask {
        section: Section::Data,
        record: question.to_string(),
        request: LlmRequest::new(prompt).with_system(state.prompts.system()),
        include_history: true,
    };
    ChatCore::ask(state, session, ask, on_fragment).await
}

/// Shape, column types, missing counts and the first rows.
pub fn describe(session: &SessionContext) -> Result<String, InteractionError> {
    let ds = current(session)?;
    let t = &ds.table;
    let mut out = format!("**Dataset:** `{}` ({} rows × {} columns)\n\n", ds.name, t.n_rows(), t.n_cols());
    let items: Vec<(String, String)> = (0..t.n_cols())
        .map(|i| {
            let kind = if t.is_numeric(i) { "number" } else { "text" };
            let missing = t.column_cells(i).filter(|c| c.is_empty()).count();
            (t.columns()[i].clone(), format!("{kind}, {missing} missing"))
        })
        .collect();
    out.push_str(&dataset::series_markdown("column", "type", &items));
    out.push_str("\n\n");
    out.push_str(&t.to_markdown(PREVIEW_ROWS));
    Ok(out)
}

pub fn dedupe(session: &mut SessionContext) -> Result<String, InteractionError> {
    let table = &mut current_mut(session)?.table;
    let removed = table.drop_duplicates();
    info!(removed, rows = table.n_rows(), "duplicates dropped");
    Ok(format!(
        "Successfully removed **{removed}** duplicate rows. The dataset now has **{}** rows.",
        table.n_rows()
    ))
}

pub fn fill(session: &mut SessionContext, column: &str, fill: &Fill) -> Result<String, InteractionError> {
    let table = &mut current_mut(session)?.table;
    if table.columns_with_missing().is_empty() {
        return Ok("No columns with missing values were found.".to_string());
    }
    let outcome = table.fill_missing(column, fill)?;
    info!(column, filled = outcome.filled, method = outcome.method, "missing values filled");
    Ok(outcome.describe())
}

pub fn outliers(session: &SessionContext, column: &str) -> Result<String, InteractionError> {
    let table = &current(session)?.table;
    let report = stats::detect_outliers(table, column)?;
    info!(column, outliers = report.rows.len(), "outlier analysis done");
    Ok(report.describe(table))
}

pub fn correlation(session: &SessionContext) -> Result<String, InteractionError> {
    let matrix = stats::correlation(&current(session)?.table)?;
    Ok(matrix.to_markdown())
}

/// Write the current table as CSV. Defaults to `cleaned_data.csv` in the work dir.
pub fn export(
    state: &AgentsState,
    session: &SessionContext,
    path: Option<&Path>,
) -> Result<PathBuf, InteractionError> {
    let table = &current(session)?.table;
    let dest = state.resolve(path.unwrap_or(Path::new(dataset::clean::EXPORT_FILE_NAME)));
    table.export_csv(&dest)?;
    info!(path = %dest.display(), rows = table.n_rows(), "dataset exported");
    Ok(dest)
}

/// Write the HTML profiling report. Defaults to `report_<stem>.html` in the work dir.
pub fn profile(
    state: &AgentsState,
    session: &SessionContext,
    path: Option<&Path>,
) -> Result<PathBuf, InteractionError> {
    let ds = current(session)?;
    let dest = match path {
        Some(p) => state.resolve(p),
        None => state.resolve(Path::new(&dataset::profile::report_file_name(&ds.name))),
    };
    Ok(dataset::profile::write_report(&ds.table, &ds.name, &dest)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::tests::dummy_state;
    use crate::dataset::DatasetError;
    use crate::session::Role;

    fn loaded() -> SessionContext {
        let mut session = SessionContext::new();
        let table = dataset::load::parse_csv(
            b"City,Customer Name,Sales,Payment Mode\nPune,Asha,100,Card\nDelhi,Ravi,250,Cash\nPune,Asha,100,Card\n",
        )
        .unwrap();
        session.dataset = Some(LoadedDataset { name: "sales.csv".into(), table });
        session
    }

    #[tokio::test]
    async fn upload_restarts_transcript_with_summary() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        session.data.push(Role::User, "stale");

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();

        let msg = upload(&state, &mut session, &path).await.unwrap();
        assert!(msg.starts_with("Successfully loaded `sales.csv`. The dataset has **2 rows** and **2 columns**."));
        assert_eq!(session.data.len(), 2);
        assert_eq!(session.data.turns()[1].text, CAPABILITIES);
        assert_eq!(session.dataset.as_ref().unwrap().table.n_rows(), 2);

        session.reset_section(Section::Data);
        assert!(session.data.is_empty());
        assert!(session.dataset.is_none());
    }

    #[tokio::test]
    async fn questions_need_a_dataset() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        let err = ask(&state, &mut session, "highest sale", &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, InteractionError::NoDataset));
        assert!(session.data.is_empty());
    }

    #[tokio::test]
    async fn keyword_query_sends_summary_prompt() {
        let state = dummy_state();
        let mut session = loaded();
        let reply = ask(&state, &mut session, "What is the highest sale?", &mut |_| {}).await.unwrap();
        assert!(reply.contains("Given the following calculation result:"));
        assert!(reply.contains("250"));
        assert_eq!(session.data.turns()[0].text, "What is the highest sale?");
    }

    #[tokio::test]
    async fn unmatched_question_sends_dataset_table() {
        let state = dummy_state();
        let mut session = loaded();
        let reply = ask(&state, &mut session, "Which city is busiest?", &mut |_| {}).await.unwrap();
        assert!(reply.contains("Dataset Context:\n|"));
        assert!(reply.ends_with("User Question: Which city is busiest?"));
    }

    #[tokio::test]
    async fn failing_query_is_answered_locally() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        let table = dataset::load::parse_csv(b"name\nx\n").unwrap();
        session.dataset = Some(LoadedDataset { name: "n.csv".into(), table });

        let mut streamed = String::new();
        let reply = ask(&state, &mut session, "total sum of sales", &mut |f| streamed.push_str(f)).await.unwrap();
        assert!(reply.starts_with("An error occurred while trying to fulfill your request: "));
        assert!(reply.ends_with("Please check your dataset columns."));
        assert_eq!(streamed, reply);
        assert_eq!(session.data.last().unwrap().role, Role::Assistant);
    }

    #[test]
    fn cleaning_commands() {
        let mut session = loaded();
        assert!(dedupe(&mut session).unwrap().contains("removed **1** duplicate rows"));
        assert_eq!(fill(&mut session, "Sales", &Fill::Mean).unwrap(), "No columns with missing values were found.");
        assert!(describe(&session).unwrap().contains("| Sales"));
        assert!(matches!(
            outliers(&session, "City"),
            Err(InteractionError::Dataset(DatasetError::NotNumeric(_)))
        ));
        assert!(correlation(&session).unwrap().contains("Sales"));
    }

    #[test]
    fn export_and_profile_default_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut state = dummy_state();
        state.work_dir = dir.path().to_path_buf();
        let session = loaded();

        let csv = export(&state, &session, None).unwrap();
        assert_eq!(csv, dir.path().join("cleaned_data.csv"));
        assert!(std::fs::read_to_string(&csv).unwrap().starts_with("City,Customer Name,Sales,Payment Mode\n"));

        let report = profile(&state, &session, None).unwrap();
        assert_eq!(report, dir.path().join("report_sales.html"));
        assert!(report.exists());
    }

    #[test]
    fn commands_need_a_dataset() {
        let mut session = SessionContext::new();
        assert!(matches!(dedupe(&mut session), Err(InteractionError::NoDataset)));
        assert!(matches!(correlation(&session), Err(InteractionError::NoDataset)));
    }
}
