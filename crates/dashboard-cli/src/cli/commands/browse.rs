//! Browse command handlers (lists and detail pages).

use anyhow::{Context, Result};
use dashboard_core::api::{ApiClient, Comment, Post, User};
use dashboard_core::browse::{ContentType, Detail, Item, Listing, Related};
use dashboard_core::config::Config;
use dashboard_core::session::AuthError;

use super::load_session;

/// Fails unless someone is logged in; returns the greeting name.
fn require_login() -> Result<String> {
    let session = load_session()?;
    match session.require_user() {
        Ok(user) => Ok(user.display_name()),
        Err(AuthError::NotAuthenticated) => {
            anyhow::bail!("Not logged in. Run `dashboard login` first.")
        }
        Err(err) => Err(err.into()),
    }
}

fn client(config: &Config) -> Result<ApiClient> {
    ApiClient::from_config(&config.api).context("create API client")
}

pub async fn list(config: &Config, kind: ContentType, search: Option<&str>) -> Result<()> {
    let name = require_login()?;
    let client = client(config)?;

    let mut listing = Listing::load(&client, kind)
        .await
        .with_context(|| format!("load {kind}"))?;
    if let Some(term) = search {
        listing.search(term);
    }

    println!("Welcome, {name}");
    println!();
    for item in listing.visible() {
        print_row(item);
    }
    if listing.visible_count() > 0 {
        println!();
    }
    println!("{}", listing.summary());
    Ok(())
}

pub async fn show(config: &Config, kind: ContentType, id: u64) -> Result<()> {
    require_login()?;
    let client = client(config)?;

    let detail = Detail::load(&client, kind, id)
        .await
        .with_context(|| format!("load {kind} {id}"))?;

    match &detail.item {
        Item::User(user) => print_user(user),
        Item::Post(post) => print_post(post),
    }
    println!();
    match (&detail.item, &detail.related) {
        (Item::User(user), Related::UserPosts(posts)) => print_user_posts(user, posts),
        (_, Related::PostComments(comments)) => print_comments(comments),
        _ => {}
    }
    Ok(())
}

fn print_row(item: &Item) {
    match item {
        Item::User(user) => println!(
            "{:>4}  {}  @{}  {}",
            user.id, user.name, user.username, user.email
        ),
        Item::Post(post) => println!("{:>4}  {}  (user {})", post.id, post.title, post.user_id),
    }
}

fn print_user(user: &User) {
    println!("{} (@{})", user.name, user.username);
    println!("  Email:   {}", user.email);
    if !user.phone.is_empty() {
        println!("  Phone:   {}", user.phone);
    }
    if !user.website.is_empty() {
        println!("  Website: {}", user.website);
    }
    if let Some(address) = &user.address {
        println!(
            "  Address: {} {}, {}, {}",
            address.street, address.suite, address.city, address.zipcode
        );
        if let Some(geo) = &address.geo {
            println!("  Coordinates: {}, {}", geo.lat, geo.lng);
        }
    }
    if let Some(company) = &user.company {
        println!("  Company: {}", company.name);
        if !company.catch_phrase.is_empty() {
            println!("    \"{}\"", company.catch_phrase);
        }
        if !company.bs.is_empty() {
            println!("    {}", company.bs);
        }
    }
}

fn print_post(post: &Post) {
    println!("Post #{}", post.id);
    println!("{}", post.title);
    println!("By User ID: {}", post.user_id);
    println!();
    println!("{}", post.body);
}

fn print_user_posts(user: &User, posts: &[Post]) {
    println!("Posts by {} ({})", user.name, posts.len());
    if posts.is_empty() {
        println!("  No posts found for this user.");
    }
    for post in posts {
        println!("  #{} {}", post.id, post.title);
    }
}

fn print_comments(comments: &[Comment]) {
    println!("Comments ({})", comments.len());
    if comments.is_empty() {
        println!("  No comments found for this post.");
    }
    for comment in comments {
        println!("  {} <{}>", comment.name, comment.email);
        println!("    {}", comment.body);
    }
}
