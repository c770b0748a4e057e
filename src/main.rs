use std::{process, sync::Arc};

use scribe::{
    application::{
        auth::{SessionError, SessionService},
        error::AppError,
        media::MediaStore,
        pagination::Paginator,
        posts::PostService,
        repos::{
            CommentsRepo, CreateUserParams, GroupsRepo, GroupsWriteRepo, HealthRepo, PostsRepo,
            PostsWriteRepo, SessionsRepo, UsersRepo, UsersWriteRepo,
        },
    },
    config,
    domain::groups::NewGroup,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AuthConfig, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Groups(args) => match args.command {
            config::GroupsCommand::Create(create) => run_create_group(settings, create).await,
        },
        config::Command::Users(args) => match args.command {
            config::UsersCommand::Create(create) => run_create_user(settings, create).await,
        },
        config::Command::Sessions(args) => match args.command {
            config::SessionsCommand::Issue(issue) => run_issue_session(settings, issue).await,
        },
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let storage = UploadStorage::new(settings.uploads.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let media: Arc<dyn MediaStore> = Arc::new(storage);

    let posts = PostService::new(
        users_repo.clone(),
        groups_repo,
        posts_repo,
        posts_write_repo,
        comments_repo,
        media.clone(),
        Paginator::new(settings.pagination.page_size),
    );
    let sessions = SessionService::new(sessions_repo, users_repo);

    let max_request_bytes =
        usize::try_from(settings.uploads.max_request_bytes.get()).unwrap_or(usize::MAX);

    Ok(HttpState {
        posts: Arc::new(posts),
        sessions: Arc::new(sessions),
        media,
        health: health_repo,
        auth: Arc::new(AuthConfig {
            login_url: settings.auth.login_url.clone(),
            session_cookie: settings.auth.session_cookie.clone(),
        }),
        max_request_bytes,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings)?;
    let router = http::build_router(state);

    let addr = settings.server.public_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;

    info!(
        target = "scribe::serve",
        addr = %addr,
        uploads = %settings.uploads.directory.display(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_create_group(
    settings: config::Settings,
    args: config::CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let group = NewGroup::new(&args.title, args.slug.as_deref(), args.description.as_deref())?;
    let record = repositories.create_group(group).await?;

    info!(
        target = "scribe::groups",
        id = record.id,
        slug = %record.slug,
        "group created"
    );
    println!("{}\t{}\t{}", record.id, record.slug, record.title);
    Ok(())
}

async fn run_create_user(
    settings: config::Settings,
    args: config::CreateUserArgs,
) -> Result<(), AppError> {
    let username = args.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }

    let repositories = init_repositories(&settings).await?;
    let record = repositories
        .create_user(CreateUserParams {
            username,
            first_name: args.first_name.trim().to_string(),
            last_name: args.last_name.trim().to_string(),
        })
        .await?;

    info!(
        target = "scribe::users",
        id = record.id,
        username = %record.username,
        "user created"
    );
    println!("{}\t{}", record.id, record.username);
    Ok(())
}

async fn run_issue_session(
    settings: config::Settings,
    args: config::IssueSessionArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories;
    let service = SessionService::new(sessions_repo, users_repo);

    let hours = args
        .ttl_hours
        .unwrap_or(settings.auth.session_ttl_hours.get());
    let ttl = time::Duration::hours(i64::from(hours));

    let issued = service
        .issue(&args.username, ttl)
        .await
        .map_err(|err| match err {
            SessionError::Repo(err) => AppError::from(err),
            other => AppError::validation(other.to_string()),
        })?;

    info!(
        target = "scribe::sessions",
        user_id = issued.record.user_id,
        expires_at = %issued.record.expires_at,
        "session issued"
    );
    println!("{}", issued.token);
    Ok(())
}
