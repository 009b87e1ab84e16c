//! Subcommand execution against the core services.

use crate::commands::{
    AdminCommand, BackendCommand, CalendarCommand, ContactCommand, DeployCommand,
    GithubCommand, SettingsCommand, TodoCommand,
};
use crate::output::Output;
use chrono::Utc;
use log::info;
use recondesk_core::integrations::deploy::{DeployStatusCheck, SimulatedDeploySource};
use recondesk_core::integrations::github::{GitHubClient, GitHubConfig};
use recondesk_core::integrations::poller::{PollSnapshot, StatusCheck, StatusPoller};
use recondesk_core::integrations::supabase::{
    connect_backend, BackendClient, BackendHealth, BackendHealthCheck,
};
use recondesk_core::model::settings::GitHubCredentials;
use recondesk_core::model::todo::VehicleLink;
use recondesk_core::service::contact_service::ContactQuery;
use recondesk_core::service::todo_service::TodoQuery;
use recondesk_core::{
    AppConfig, CalendarService, Clock, ContactDraft, ContactService, DashboardService,
    SettingsService, SqliteSlotRepository, SystemClock, TenantId, TodoDraft, TodoService,
};
use rusqlite::Connection;
use std::error::Error;
use std::sync::Arc;

pub(crate) type CliResult<T> = Result<T, Box<dyn Error>>;

pub(crate) struct Context<'conn> {
    repo: SqliteSlotRepository<'conn>,
    tenant: Option<TenantId>,
    config: AppConfig,
    output: Output,
}

impl<'conn> Context<'conn> {
    pub(crate) fn new(
        conn: &'conn Connection,
        tenant: Option<TenantId>,
        config: AppConfig,
        output: Output,
    ) -> Self {
        Self {
            repo: SqliteSlotRepository::new(conn),
            tenant,
            config,
            output,
        }
    }

    fn tenant(&self) -> CliResult<&TenantId> {
        self.tenant
            .as_ref()
            .ok_or_else(|| "this command needs --tenant <dealership-id>".into())
    }
}

pub(crate) fn contact(ctx: &Context<'_>, command: ContactCommand) -> CliResult<()> {
    let tenant = ctx.tenant()?;
    let service = ContactService::new(&ctx.repo);
    let out = &ctx.output;

    match command {
        ContactCommand::Add {
            name,
            phone,
            company,
            title,
            email,
            address,
            category,
            specialties,
            notes,
        } => {
            let contact = service.create_contact(
                tenant,
                ContactDraft {
                    name,
                    phone,
                    company,
                    title,
                    email,
                    address,
                    category,
                    specialties,
                    notes,
                },
            )?;
            out.contact(&contact)?;
        }
        ContactCommand::List {
            search,
            category,
            favorites,
            all,
            sort,
        } => {
            let contacts = service.list_contacts(
                tenant,
                &ContactQuery {
                    search,
                    category,
                    favorites_only: favorites,
                    include_inactive: all,
                    sort: sort.into(),
                },
            )?;
            out.contacts(&contacts)?;
        }
        ContactCommand::Show { id } => match service.get_contact(tenant, id)? {
            Some(contact) => out.contact(&contact)?,
            None => return Err(format!("contact not found: {id}").into()),
        },
        ContactCommand::Edit { id, changes } => {
            let mut contact = service
                .get_contact(tenant, id)?
                .ok_or_else(|| format!("contact not found: {id}"))?;
            changes.apply(&mut contact);
            out.contact(&service.update_contact(tenant, contact)?)?;
        }
        ContactCommand::Favorite { id } => out.contact(&service.toggle_favorite(tenant, id)?)?,
        ContactCommand::Activate { id } => out.contact(&service.set_active(tenant, id, true)?)?,
        ContactCommand::Deactivate { id } => {
            out.contact(&service.set_active(tenant, id, false)?)?
        }
        ContactCommand::Call { id } => out.contact(&service.record_call(tenant, id)?)?,
        ContactCommand::Delete { id } => {
            service.delete_contact(tenant, id)?;
            out.message(&format!("deleted contact {id}"))?;
        }
        ContactCommand::Stats => out.contact_stats(&service.contact_stats(tenant)?)?,
    }
    Ok(())
}

pub(crate) fn todo(ctx: &Context<'_>, command: TodoCommand) -> CliResult<()> {
    let tenant = ctx.tenant()?;
    let service = TodoService::new(&ctx.repo);
    let now = SystemClock.now_local();
    let out = &ctx.output;

    match command {
        TodoCommand::Add {
            title,
            description,
            priority,
            category,
            assigned_to,
            assigned_by,
            due,
            at,
            vehicle_id,
            vehicle_name,
            tags,
            notes,
        } => {
            let vehicle = vehicle_id
                .zip(vehicle_name)
                .map(|(id, name)| VehicleLink { id, name });
            let todo = service.create_todo(
                tenant,
                TodoDraft {
                    title,
                    description,
                    priority,
                    category,
                    assigned_to,
                    assigned_by,
                    due_date: due,
                    due_time: at,
                    vehicle,
                    tags,
                    notes,
                },
            )?;
            out.todo(&todo, now)?;
        }
        TodoCommand::List {
            search,
            status,
            priority,
            category,
            assigned,
            vehicle,
            overdue,
            due,
            sort,
        } => {
            let todos = service.list_todos(
                tenant,
                &TodoQuery {
                    search,
                    status,
                    priority,
                    category,
                    assigned_to: assigned,
                    vehicle_id: vehicle,
                    overdue_only: overdue,
                    due_on: due,
                    sort: sort.into(),
                },
            )?;
            out.todos(&todos, now)?;
        }
        TodoCommand::Show { id } => match service.get_todo(tenant, id)? {
            Some(todo) => out.todo(&todo, now)?,
            None => return Err(format!("todo not found: {id}").into()),
        },
        TodoCommand::Edit { id, changes } => {
            let mut todo = service
                .get_todo(tenant, id)?
                .ok_or_else(|| format!("todo not found: {id}"))?;
            changes.apply(&mut todo);
            out.todo(&service.update_todo(tenant, todo)?, now)?;
        }
        TodoCommand::Status { id, status, actor } => {
            out.todo(&service.update_status(tenant, id, status, &actor)?, now)?
        }
        TodoCommand::Reschedule { id, due, at, clear } => {
            let mut todo = service
                .get_todo(tenant, id)?
                .ok_or_else(|| format!("todo not found: {id}"))?;
            if clear {
                todo.due_date = None;
                todo.due_time = None;
            } else {
                todo.due_date = due;
                todo.due_time = at;
            }
            out.todo(&service.update_todo(tenant, todo)?, now)?;
        }
        TodoCommand::Delete { id } => {
            service.delete_todo(tenant, id)?;
            out.message(&format!("deleted todo {id}"))?;
        }
        TodoCommand::Overdue => out.todos(&service.overdue_todos(tenant)?, now)?,
        TodoCommand::Stats => out.todo_stats(&service.todo_stats(tenant)?)?,
    }
    Ok(())
}

pub(crate) fn calendar(ctx: &Context<'_>, command: CalendarCommand) -> CliResult<()> {
    let tenant = ctx.tenant()?;
    let service = CalendarService::new(&ctx.repo);
    let events = match command {
        CalendarCommand::List {
            from: Some(from),
            to: Some(to),
        } => service.events_between(tenant, from, to)?,
        CalendarCommand::List { .. } => service.list_events(tenant)?,
        CalendarCommand::Day { date } => service.events_on(tenant, date)?,
        CalendarCommand::Todo { id } => {
            return match service.event_for_todo(tenant, id)? {
                Some(event) => Ok(ctx.output.event(&event)?),
                None => Err(format!("no calendar event for todo {id}").into()),
            };
        }
    };
    ctx.output.events(&events)?;
    Ok(())
}

pub(crate) fn admin(ctx: &Context<'_>, command: AdminCommand) -> CliResult<()> {
    let service = DashboardService::new(&ctx.repo);
    let out = &ctx.output;
    match command {
        AdminCommand::Register { id, name, location } => {
            out.dealership(&service.register_dealership(id, &name, location)?)?
        }
        AdminCommand::List => out.dealerships(&service.list_dealerships()?)?,
        AdminCommand::Activate { id } => {
            out.dealership(&service.set_dealership_active(&id, true)?)?
        }
        AdminCommand::Deactivate { id } => {
            out.dealership(&service.set_dealership_active(&id, false)?)?
        }
        AdminCommand::Overview => out.overview(&service.overview()?)?,
    }
    Ok(())
}

pub(crate) fn settings(ctx: &Context<'_>, command: SettingsCommand) -> CliResult<()> {
    let tenant = ctx.tenant()?;
    let service = SettingsService::new(&ctx.repo);
    let mut settings = service.get_settings(tenant)?;
    if let SettingsCommand::Set {
        display_name,
        default_assignee,
        deploy_url,
    } = command
    {
        if display_name.is_some() {
            settings.display_name = display_name;
        }
        if default_assignee.is_some() {
            settings.default_assignee = default_assignee;
        }
        if deploy_url.is_some() {
            settings.deploy_site_url = deploy_url;
        }
        service.save_settings(tenant, &settings)?;
    }

    let summary = format!(
        "display_name={} default_assignee={} deploy_url={} github={}",
        settings.display_name.as_deref().unwrap_or("-"),
        settings.default_assignee.as_deref().unwrap_or("-"),
        settings.deploy_site_url.as_deref().unwrap_or("-"),
        settings
            .github
            .as_ref()
            .map(|github| format!("{}/{}@{}", github.owner, github.repo, github.branch))
            .unwrap_or_else(|| "-".to_string()),
    );
    ctx.output.message(&summary)?;
    Ok(())
}

pub(crate) async fn github(ctx: &Context<'_>, command: GithubCommand) -> CliResult<()> {
    let tenant = ctx.tenant()?;
    let settings_service = SettingsService::new(&ctx.repo);
    let out = &ctx.output;

    let credentials = match command {
        GithubCommand::Connect {
            owner,
            repo,
            branch,
            token,
        } => {
            settings_service.set_github_credentials(
                tenant,
                GitHubCredentials {
                    owner,
                    repo,
                    branch,
                    token,
                },
            )?;
            out.message("GitHub credentials saved")?;
            return Ok(());
        }
        GithubCommand::Disconnect => {
            settings_service.clear_github_credentials(tenant)?;
            out.message("GitHub credentials removed")?;
            return Ok(());
        }
        _ => settings_service
            .get_settings(tenant)?
            .github
            .ok_or_else(|| format!("GitHub is not connected for {tenant}; run `github connect`"))?,
    };

    let client = GitHubClient::new(GitHubConfig::new(credentials))?;
    match command {
        GithubCommand::Ls { path } => out.contents(&client.list_contents(&path).await?)?,
        GithubCommand::Commit {
            path,
            message,
            content,
            file,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(file)) => std::fs::read_to_string(&file)?,
                (None, None) => return Err("provide --content or --file".into()),
            };
            let outcome = client.commit_file(&path, &content, &message).await?;
            out.message(&format!("committed {path} as {}", outcome.commit_sha))?;
        }
        GithubCommand::Connect { .. } | GithubCommand::Disconnect => {}
    }
    Ok(())
}

pub(crate) async fn deploy(ctx: &Context<'_>, command: DeployCommand) -> CliResult<()> {
    let DeployCommand::Status { watch, count } = command;
    let site_url = match ctx.tenant.as_ref() {
        Some(tenant) => SettingsService::new(&ctx.repo)
            .get_settings(tenant)?
            .deploy_site_url
            .or_else(|| ctx.config.deploy_site_url.clone()),
        None => ctx.config.deploy_site_url.clone(),
    };
    let check = DeployStatusCheck::new(SimulatedDeploySource::new(site_url));

    if !watch {
        let snapshot = match check.check().await {
            Ok(value) => PollSnapshot::Ready {
                value,
                polled_at: Utc::now(),
            },
            Err(message) => PollSnapshot::Failed {
                message,
                polled_at: Utc::now(),
            },
        };
        ctx.output.deploy_snapshot(&snapshot)?;
        return Ok(());
    }

    info!(
        "event=deploy_watch module=cli status=start interval_secs={}",
        ctx.config.poll_interval.as_secs()
    );
    let mut poller = StatusPoller::spawn(check, ctx.config.poll_interval);
    let mut printed = 0usize;
    while let Some(snapshot) = poller.next().await {
        ctx.output.deploy_snapshot(&snapshot)?;
        printed += 1;
        if count.is_some_and(|limit| printed >= limit) {
            break;
        }
    }
    Ok(())
}

pub(crate) async fn backend(ctx: &Context<'_>, command: BackendCommand) -> CliResult<()> {
    let backend = connect_backend(ctx.config.supabase.clone())?;
    let writes = matches!(
        command,
        BackendCommand::Insert { .. }
            | BackendCommand::Update { .. }
            | BackendCommand::Delete { .. }
    );
    if writes && !backend.is_configured() {
        return Err("backend not configured (set SUPABASE_URL and SUPABASE_ANON_KEY)".into());
    }
    match command {
        BackendCommand::Status => {
            let check = BackendHealthCheck::new(Arc::from(backend));
            let text = match check.check().await {
                Ok(BackendHealth::NotConfigured) => {
                    "backend: not configured (set SUPABASE_URL and SUPABASE_ANON_KEY)".to_string()
                }
                Ok(BackendHealth::Reachable) => "backend: reachable".to_string(),
                Err(message) => format!("backend: error ({message})"),
            };
            ctx.output.message(&text)?;
        }
        BackendCommand::Select {
            table,
            filters,
            limit,
        } => {
            let rows = backend.select(table, &filters, limit).await?;
            ctx.output.rows(&rows)?;
        }
        BackendCommand::Insert { table, row } => {
            let rows = backend.insert(table, &row).await?;
            report_write(ctx, "inserted", &rows)?;
        }
        BackendCommand::Update {
            table,
            filters,
            patch,
        } => {
            let rows = backend.update(table, &filters, &patch).await?;
            report_write(ctx, "updated", &rows)?;
        }
        BackendCommand::Delete { table, filters } => {
            let rows = backend.delete(table, &filters).await?;
            report_write(ctx, "deleted", &rows)?;
        }
    }
    Ok(())
}

fn report_write(ctx: &Context<'_>, verb: &str, rows: &[serde_json::Value]) -> CliResult<()> {
    info!(
        "event=backend_write module=cli status=ok verb={verb} rows={}",
        rows.len()
    );
    ctx.output.rows(rows)?;
    if !ctx.output.is_json() {
        println!("{verb} {} row(s)", rows.len());
    }
    Ok(())
}
