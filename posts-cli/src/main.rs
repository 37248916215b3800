use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use posts_client::{ClientError, PostsClient};
use std::fs;
use std::path::PathBuf;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the posts server (falls back to POSTS_SERVER)
    #[arg(short, long)]
    server: Option<String>,

    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    Profile,

    Refresh,

    Logout,

    Status,

    List,

    Get {
        #[arg(short, long)]
        id: i64,
    },

    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,
    },

    Update {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,
    },

    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// Run register, login, profile, refresh and logout against the server
    Smoke {
        #[arg(short, long, default_value = "password123")]
        password: String,
    },
}

struct TokenManager {
    token_path: PathBuf,
}

impl TokenManager {
    fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let token_path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".posts_token")
            }
        };

        Ok(Self { token_path })
    }

    fn save_token(&self, token: &str) -> Result<()> {
        fs::write(&self.token_path, token)
            .with_context(|| format!("Failed to save token to {:?}", self.token_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms)?;
        }

        println!("✓ Token saved to {:?}", self.token_path);
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.token_path) {
            Ok(token) => {
                let token = token.trim().to_string();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }

    fn clear_token(&self) -> Result<()> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .with_context(|| format!("Failed to remove token file {:?}", self.token_path))?;
            println!("✓ Token file removed");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let server = cli
        .server
        .or_else(|| std::env::var("POSTS_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    let token_manager = TokenManager::new(cli.token_file)?;
    let mut client = PostsClient::new(server.as_str());
    if let Some(token) = token_manager.load_token()? {
        client.set_token(token);
    }

    match &cli.command {
        Commands::Status => print_status(&token_manager)?,

        Commands::Smoke { password } => {
            println!("🔌 Smoke testing: {}", server);
            run_smoke(&server, password).await?;
        }

        Commands::Register {
            name,
            email,
            password,
        } => {
            println!("🔌 Connecting to: {}", server);
            println!("📝 Registering user: {}", email);

            match client.register(name, email, password).await {
                Ok(user) => {
                    println!("✅ Registration successful!");
                    println!("   User ID: {}", user.id);
                    println!("   Name: {}", user.name);
                    println!("   Email: {}", user.email);
                    println!("\n   Next: posts-cli login --email {} --password <password>", user.email);
                }
                Err(e) => fail("Registration failed", &e),
            }
        }

        Commands::Login { email, password } => {
            println!("🔑 Logging in as: {}", email);

            match client.login(email, password).await {
                Ok(tokens) => {
                    println!("✅ Login successful!");
                    println!("   User ID: {}", tokens.user.id);
                    println!("   Name: {}", tokens.user.name);
                    println!("   Expires in: {}s", tokens.expires_in);

                    token_manager.save_token(&tokens.token)?;
                }
                Err(e) => fail("Login failed", &e),
            }
        }

        Commands::Profile => match client.profile().await {
            Ok(user) => {
                println!("✅ Profile:");
                println!("   User ID: {}", user.id);
                println!("   Name: {}", user.name);
                println!("   Email: {}", user.email);
                println!("   Registered: {}", user.created_at);
            }
            Err(e) => fail("Failed to load profile", &e),
        },

        Commands::Refresh => match client.refresh().await {
            Ok(tokens) => {
                println!("✅ Token refreshed, expires in {}s", tokens.expires_in);
                token_manager.save_token(&tokens.token)?;
            }
            Err(e) => fail("Refresh failed", &e),
        },

        Commands::Logout => match client.logout().await {
            Ok(message) => {
                println!("✅ {}", message);
                token_manager.clear_token()?;
            }
            Err(e) => fail("Logout failed", &e),
        },

        Commands::List => {
            println!("📋 Listing posts");

            match client.list_posts().await {
                Ok(posts) => {
                    println!("✅ Found {} posts", posts.len());
                    println!();

                    if posts.is_empty() {
                        println!("   No posts found");
                        println!("   Tip: Create your first post: posts-cli create --title \"My Post\" --description \"Hello\"");
                    } else {
                        for (i, post) in posts.iter().enumerate() {
                            println!("   {}. [{}] {}", i + 1, post.id, post.title);
                            println!("      {}", truncate(&post.description, 50));
                            println!();
                        }
                    }
                }
                Err(e) => fail("Failed to list posts", &e),
            }
        }

        Commands::Get { id } => {
            println!("🔍 Getting post #{}", id);

            match client.get_post(*id).await {
                Ok(post) => {
                    println!("✅ Post retrieved:");
                    println!("   ID: {}", post.id);
                    println!("   Title: {}", post.title);
                    println!("   Description: {}", post.description);
                }
                Err(e) => fail(&format!("Post #{} unavailable", id), &e),
            }
        }

        Commands::Create { title, description } => {
            println!("📝 Creating new post...");

            match client.create_post(title, description).await {
                Ok(post) => {
                    println!("✅ Post created successfully!");
                    println!("   ID: {}", post.id);
                    println!("   Title: {}", post.title);
                }
                Err(e) => fail("Failed to create post", &e),
            }
        }

        Commands::Update {
            id,
            title,
            description,
        } => {
            println!("✏️ Updating post #{}", id);

            match client.update_post(*id, title, description).await {
                Ok(post) => {
                    println!("✅ Post updated successfully!");
                    println!("   ID: {}", post.id);
                    println!("   Title: {}", post.title);
                    println!("   Description: {}", post.description);
                    println!("   Updated: {}", post.updated_at);
                }
                Err(e) => fail("Failed to update post", &e),
            }
        }

        Commands::Delete { id } => {
            println!("🗑️ Deleting post #{}", id);

            match client.delete_post(*id).await {
                Ok(post) => {
                    println!("✅ Post deleted successfully!");
                    println!("   Removed: [{}] {}", post.id, post.title);
                }
                Err(e) => fail("Failed to delete post", &e),
            }
        }
    }

    Ok(())
}

fn print_status(token_manager: &TokenManager) -> Result<()> {
    match token_manager.load_token()? {
        Some(token) => {
            let preview: String = token.chars().take(20).collect();
            println!("🔑 Token file: {:?}", token_manager.token_path);
            println!("   Token: {}...", preview);
            println!("   Length: {} characters", token.len());
            println!("\n   To verify token, try: posts-cli profile");
        }
        None => {
            println!("❌ No token found");
            println!("   Please login first: posts-cli login --email <email> --password <password>");
        }
    }
    Ok(())
}

fn fail(action: &str, e: &ClientError) -> ! {
    println!("❌ {}: {}", action, e);
    if e.is_unauthorized() {
        println!("   Please login first: posts-cli login --email <email> --password <password>");
    } else if e.is_not_found() {
        println!("   Tip: Use 'list' command to see available posts");
    }
    std::process::exit(1);
}

fn pass(step: &str, detail: impl std::fmt::Display) {
    println!("{} {:<24} {}", "PASS".green().bold(), step, detail);
}

fn step_failed(step: &str, detail: impl std::fmt::Display) -> anyhow::Error {
    println!("{} {:<24} {}", "FAIL".red().bold(), step, detail);
    anyhow::anyhow!("smoke test failed at '{}'", step)
}

fn expect_rejected(step: &str, outcome: Result<posts_client::User, ClientError>) -> Result<()> {
    match outcome {
        Err(e) if e.is_unauthorized() => {
            pass(step, "rejected with 401");
            Ok(())
        }
        Err(e) => Err(step_failed(step, format!("unexpected error: {}", e))),
        Ok(user) => Err(step_failed(
            step,
            format!("token still accepted for user #{}", user.id),
        )),
    }
}

async fn run_smoke(server: &str, password: &str) -> Result<()> {
    let mut client = PostsClient::new(server);
    let email = format!("smoke{}@example.com", chrono::Utc::now().timestamp_millis());

    let user = client
        .register("Smoke Test", &email, password)
        .await
        .map_err(|e| step_failed("register", e))?;
    pass("register", format!("user #{} <{}>", user.id, user.email));

    let issued = client
        .login(&email, password)
        .await
        .map_err(|e| step_failed("login", e))?;
    pass("login", format!("{} token, {}s", issued.token_type, issued.expires_in));

    let profile = client
        .profile()
        .await
        .map_err(|e| step_failed("profile", e))?;
    if profile.email != email {
        return Err(step_failed(
            "profile",
            format!("expected {}, got {}", email, profile.email),
        ));
    }
    pass("profile", &profile.email);

    let refreshed = client
        .refresh()
        .await
        .map_err(|e| step_failed("refresh", e))?;
    if refreshed.token == issued.token {
        return Err(step_failed("refresh", "server returned the same token"));
    }
    pass("refresh", "new token issued");

    let mut stale = PostsClient::new(server);
    stale.set_token(issued.token);
    expect_rejected("pre-refresh token", stale.profile().await)?;

    let message = client
        .logout()
        .await
        .map_err(|e| step_failed("logout", e))?;
    pass("logout", message);

    let mut revoked = PostsClient::new(server);
    revoked.set_token(refreshed.token);
    expect_rejected("token after logout", revoked.profile().await)?;

    println!("\n{}", "All smoke checks passed".green().bold());
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
