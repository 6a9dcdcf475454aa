//! services/app/src/bin/adopt.rs
//!
//! Terminal host for the adoption app. With nobody logged in it runs the signup
//! funnel (account fields, intake conversation, onboarding); otherwise it shows
//! the profile and the animals available for adoption.
//!
//! `adopt logout` asks for confirmation and clears the current session.

use adoption_core::domain::{Animal, Sender, Species, User};
use adoption_core::ports::{Alert, AlertKind, AnimalSource, KeyValueStore, Navigator, Presenter};
use app_lib::{
    adapters::{
        FileStore, HttpAnimalSource, HttpAuthApi, InMemoryAnimalSource, RouteStack,
        TerminalPresenter,
    },
    catalog::AnimalService,
    config::Config,
    error::AppError,
    intake::{IntakeController, IntakeEvent, IntakeSeed, IntakeStatus, SubmitOutcome},
    onboarding::{complete_onboarding, confirm_logout, routes},
    session::{PasswordPolicy, RemoteAuth, SessionManager},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(data_dir = %config.data_dir.display(), "Configuration loaded.");

    // --- 2. Storage & Session ---
    let file_store = FileStore::new(config.data_dir.clone());
    info!(data_dir = %file_store.root().display(), "Opened the file store.");
    let store: Arc<dyn KeyValueStore> = Arc::new(file_store);
    let session = SessionManager::restore(
        store.clone(),
        PasswordPolicy::from_flag(config.verify_passwords),
    )
    .await;

    // --- 3. Remote API & Animal Catalog ---
    let (source, remote): (Arc<dyn AnimalSource>, Option<RemoteAuth>) = match &config.api_base_url {
        Some(base_url) => {
            info!(base_url = %base_url, "Using the remote API.");
            let client = reqwest::Client::new();
            let auth_api = Arc::new(HttpAuthApi::new(client.clone(), base_url.clone()));
            (
                Arc::new(HttpAnimalSource::new(client, base_url.clone())) as Arc<dyn AnimalSource>,
                Some(RemoteAuth::new(auth_api, store)),
            )
        }
        None => (
            Arc::new(InMemoryAnimalSource::with_sample_listing()) as Arc<dyn AnimalSource>,
            None,
        ),
    };
    let catalog = AnimalService::new(source, config.animal_cache_ttl);

    let presenter = TerminalPresenter::new(true);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // --- 4. Run ---
    let logout_requested = std::env::args().nth(1).as_deref() == Some("logout");
    match session.current_user() {
        Some(_) if logout_requested => {
            let navigator = RouteStack::new(routes::HOME);
            let (confirmed_tx, confirmed_rx) = oneshot::channel();
            confirm_logout(&presenter, move || {
                let _ = confirmed_tx.send(());
            });
            if confirmed_rx.await.is_ok() {
                session.logout().await?;
                if let Some(remote) = &remote {
                    remote.sign_out().await?;
                }
                navigator.replace(routes::LOGIN);
                println!("Até logo!");
            }
        }
        Some(user) => show_home(&user, &catalog, remote.as_ref()).await?,
        None => {
            let user = signup(&config, &session, remote.as_ref(), &presenter, &mut input).await?;
            if let Some(user) = user {
                show_home(&user, &catalog, remote.as_ref()).await?;
            }
        }
    }

    session.teardown();
    Ok(())
}

async fn ask(input: &mut Input, prompt: &str) -> Result<Option<String>, AppError> {
    println!("{}", prompt);
    loop {
        match input.next_line().await? {
            None => return Ok(None),
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return Ok(Some(line.trim().to_string())),
        }
    }
}

/// Runs the whole signup funnel. `None` means input ended before it finished.
async fn signup(
    config: &Config,
    session: &SessionManager,
    remote: Option<&RemoteAuth>,
    presenter: &TerminalPresenter,
    input: &mut Input,
) -> Result<Option<User>, AppError> {
    let navigator = Arc::new(RouteStack::new(routes::SIGNUP));

    println!("Crie sua conta para começar.");
    let Some(name) = ask(input, "Nome:").await? else { return Ok(None) };
    let Some(email) = ask(input, "Email:").await? else { return Ok(None) };
    let Some(password) = ask(input, "Senha:").await? else { return Ok(None) };

    navigator.push(routes::CHAT_FORM);
    let (controller, mut events) = IntakeController::new(config.intake_timing());
    controller
        .start(IntakeSeed {
            name,
            email,
            password,
            ..IntakeSeed::default()
        })
        .await?;

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                match event {
                    IntakeEvent::Typing(true) => println!("..."),
                    IntakeEvent::Typing(false) => {}
                    IntakeEvent::Message(message) => match message.sender {
                        Sender::System => println!("\n{}", message.text),
                        Sender::User => println!("Você: {}", message.text),
                    },
                    IntakeEvent::StatusChanged(IntakeStatus::Completed) => break,
                    IntakeEvent::StatusChanged(_) => {}
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    controller.cancel();
                    warn!("Input closed before the intake form was finished.");
                    return Ok(None);
                };
                let shown = controller.format_input(&line).await;
                if controller.submit_answer(&shown).await? == SubmitOutcome::Busy {
                    println!("(aguarde um instante...)");
                }
            }
        }
    }

    let submission = controller.finish().await?;
    let user = complete_onboarding(&submission, session, presenter, navigator.clone()).await?;

    if let Some(remote) = remote {
        match remote
            .sign_up(&submission.name, &submission.email, &submission.password)
            .await
        {
            Ok(remote_user) => info!(remote_id = %remote_user.id, "Remote account created."),
            Err(e) => {
                warn!("Remote signup failed: {}", e);
                presenter.show(Alert::new(AlertKind::Info, "Conta online", e.to_string()));
            }
        }
    }
    info!(route = %navigator.current(), "Signup funnel finished.");
    Ok(Some(user))
}

fn species_label(species: Species) -> &'static str {
    match species {
        Species::Cat => "Gato",
        Species::Dog => "Cachorro",
        Species::Other => "Outro",
    }
}

fn describe(animal: &Animal, favorite: bool) -> String {
    format!(
        "{} [{}] {} - {}, {} ({} meses)",
        if favorite { "★" } else { " " },
        animal.id,
        animal.name,
        species_label(animal.species),
        animal.breed,
        animal.age_months
    )
}

async fn show_home(
    user: &User,
    catalog: &AnimalService,
    remote: Option<&RemoteAuth>,
) -> Result<(), AppError> {
    println!("\nOlá, {}!", user.name);
    println!("  Email:    {}", user.email);
    if !user.phone.is_empty() {
        println!("  Telefone: {}", user.phone);
    }
    if !user.address.is_empty() {
        println!("  Endereço: {}", user.address);
    }
    println!("  Adoções:  {}", user.adoptions);
    if let Some(remote) = remote {
        if let Some(remote_user) = remote.user().await? {
            println!("  Conta online: {}", remote_user.email);
        }
    }

    let favorites = catalog.favorites_of(user).await?;
    if !favorites.is_empty() {
        println!("\nSeus favoritos:");
        for animal in favorites.iter() {
            println!("{}", describe(animal, true));
        }
    }

    println!("\nAnimais disponíveis:");
    for animal in catalog.list().await?.iter().filter(|a| !a.adopted) {
        println!("{}", describe(animal, user.is_favorite(&animal.id)));
    }
    Ok(())
}
