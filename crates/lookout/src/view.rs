//! HTML for the setup and status pages.

use lookout_db::{CoreInfo, DbKind};

use crate::config::ConfigRecord;

/// What the setup page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupView {
    /// Blank form
    Empty,
    /// Form filled from environment defaults
    Prefilled(ConfigRecord),
    /// A failed attempt, shown back with its error
    Error(ConfigRecord),
}

impl SetupView {
    pub fn record(&self) -> Option<&ConfigRecord> {
        match self {
            SetupView::Empty => None,
            SetupView::Prefilled(record) | SetupView::Error(record) => Some(record),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SetupView::Error(record) => record.error.as_deref(),
            _ => None,
        }
    }
}

const ENGINES: [DbKind; 3] = [DbKind::Postgres, DbKind::Mysql, DbKind::Sqlite];

/// Render the setup form.
///
/// The database password is filled in only from environment defaults; a
/// failed attempt never echoes a submitted secret back.
pub fn render_setup_page(view: &SetupView) -> String {
    let empty = ConfigRecord::default();
    let record = view.record().unwrap_or(&empty);

    let error = view
        .error()
        .map(|msg| format!("<p class=\"error\">{}</p>\n", escape_html(msg)))
        .unwrap_or_default();

    let options: String = ENGINES
        .iter()
        .map(|kind| {
            let selected = if record.connection == kind.as_str() {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{0}\"{1}>{0}</option>",
                kind.as_str(),
                selected
            )
        })
        .collect();

    let db_password = match view {
        SetupView::Prefilled(record) => escape_html(&record.password),
        _ => String::new(),
    };

    let port = if record.port == 0 {
        String::new()
    } else {
        record.port.to_string()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Lookout setup</title></head>
<body>
<h1>Lookout setup</h1>
{error}<form method="post" action="/setup">
<label>Database <select name="db_connection">{options}</select></label>
<label>Host <input name="db_host" value="{host}"></label>
<label>Port <input name="db_port" value="{port}"></label>
<label>User <input name="db_user" value="{user}"></label>
<label>Password <input type="password" name="db_password" value="{db_password}"></label>
<label>Database name <input name="db_database" value="{database}"></label>
<label>Project <input name="project" value="{project}"></label>
<label>Description <input name="description" value="{description}"></label>
<label>Domain <input name="domain" value="{domain}"></label>
<label>Admin username <input name="username" value="{username}"></label>
<label>Admin password <input type="password" name="password"></label>
<label>Email <input type="email" name="email" value="{email}"></label>
<label><input type="checkbox" name="sample_data" value="on"> Load sample data</label>
<button type="submit">Save settings</button>
</form>
</body>
</html>
"#,
        error = error,
        options = options,
        host = escape_html(&record.host),
        port = port,
        user = escape_html(&record.user),
        db_password = db_password,
        database = escape_html(&record.database),
        project = escape_html(&record.project),
        description = escape_html(&record.description),
        domain = escape_html(&record.domain),
        username = escape_html(&record.username),
        email = escape_html(&record.email),
    )
}

/// Render the landing page of a configured instance.
pub fn render_status_page(core: Option<&CoreInfo>, services: usize) -> String {
    let (name, description) = match core {
        Some(core) => (escape_html(&core.name), escape_html(&core.description)),
        None => ("Lookout".to_string(), String::new()),
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{name}</title></head>\n<body>\n<h1>{name}</h1>\n<p>{description}</p>\n<p>{services} services monitored</p>\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
