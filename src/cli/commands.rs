use crate::app::{AppContext, NewsdeskError, Result};
use crate::content::Collection;
use crate::domain::{Article, SearchOptions};
use crate::ranking::{EngagementMetrics, SortMode};

pub async fn headlines(ctx: &AppContext, refresh: bool) -> Result<()> {
    if refresh {
        let collections = [
            Collection::Technology,
            Collection::General,
            Collection::Video,
            Collection::AllCategories,
        ];
        for collection in collections {
            ctx.content.invalidate(collection);
        }
    }

    ctx.content.fetch_all_if_needed().await;

    print_section("Technology", &ctx.content.technology_articles());
    print_section("General", &ctx.content.general_articles());
    print_section("Videos", &ctx.content.video_articles());
    report_error(ctx);
    Ok(())
}

pub async fn category(ctx: &AppContext, name: &str, sort: SortMode, refresh: bool) -> Result<()> {
    if refresh {
        ctx.content.invalidate(Collection::Category(name.to_string()));
    }

    let articles = ctx.content.fetch_by_category(name).await;
    print_ranked(ctx, &articles, sort);
    report_error(ctx);
    Ok(())
}

pub async fn search(ctx: &AppContext, query: &str, options: SearchOptions) -> Result<()> {
    let results = ctx.content.search(query, &options).await;

    if results.is_empty() && ctx.content.last_error().is_none() {
        println!("No results for \"{}\"", query.trim());
        return Ok(());
    }

    println!("{} results for \"{}\"", results.len(), query.trim());
    print_articles(&results);
    report_error(ctx);
    Ok(())
}

pub async fn videos(ctx: &AppContext, refresh: bool) -> Result<()> {
    if refresh {
        ctx.content.invalidate(Collection::Video);
    }

    let videos = ctx.content.fetch_videos().await;
    print_articles(&videos);
    report_error(ctx);
    Ok(())
}

pub async fn blogs(
    ctx: &AppContext,
    number: Option<u32>,
    sort: SortMode,
    refresh: bool,
) -> Result<()> {
    if refresh {
        ctx.content.invalidate(Collection::Blog);
    }

    let posts = ctx.content.fetch_blog_posts(number).await;
    if posts.is_empty() {
        println!("No blog posts");
        report_error(ctx);
        return Ok(());
    }

    for scored in ctx.ranker.rank(&posts, sort) {
        let article = &scored.article;
        println!("{}", article.title);
        println!(
            "  {} | {} | {}",
            article.display_author(),
            article.published_at.as_deref().unwrap_or("undated"),
            format_scores(&scored.metrics)
        );
        if let Some(link) = &article.link {
            println!("  {}", link);
        }
    }
    report_error(ctx);
    Ok(())
}

pub fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let article = find(ctx, id)?;
    let saved = if ctx.saved.is_saved(id) { " [saved]" } else { "" };

    println!("{}{}", article.title, saved);
    println!("By {}", article.display_author());
    if let Some(date) = &article.published_at {
        println!("Published {}", date);
    }
    if !article.category.is_empty() {
        println!("Categories: {}", article.category.join(", "));
    }
    if let Some(link) = &article.link {
        println!("{}", link);
    }
    if !article.description.is_empty() {
        println!("\n{}", article.description);
    }
    Ok(())
}

pub fn save(ctx: &AppContext, id: &str) -> Result<()> {
    let article = find(ctx, id)?;

    if ctx.saved.add(&article) {
        println!("Saved: {}", article.title);
    } else {
        println!("Already saved: {}", article.title);
    }
    Ok(())
}

pub fn unsave(ctx: &AppContext, id: &str) -> Result<()> {
    if ctx.saved.remove(id) {
        println!("Removed: {}", id);
        Ok(())
    } else {
        Err(NewsdeskError::ArticleNotFound(id.to_string()))
    }
}

pub fn saved(ctx: &AppContext, sort: SortMode) -> Result<()> {
    let items = ctx.saved.list();

    if items.is_empty() {
        println!("No saved articles");
        return Ok(());
    }

    print_ranked(ctx, &items, sort);
    Ok(())
}

fn find(ctx: &AppContext, id: &str) -> Result<Article> {
    ctx.content
        .fetch_article_by_id(id)
        .ok_or_else(|| NewsdeskError::ArticleNotFound(id.to_string()))
}

fn print_section(title: &str, articles: &[Article]) {
    println!("== {} ==", title);
    if articles.is_empty() {
        println!("  (nothing yet)");
    }
    print_articles(articles);
    println!();
}

fn print_ranked(ctx: &AppContext, articles: &[Article], sort: SortMode) {
    print_articles(&ctx.ranker.sort_by(articles, sort));
}

fn print_articles(articles: &[Article]) {
    for article in articles {
        let date = article
            .published_at
            .as_deref()
            .and_then(|d| d.get(..10))
            .unwrap_or("          ");

        println!("{} {}", date, article.title);
        if let Some(key) = article.identity_key() {
            println!("           {}", key);
        }
    }
}

fn format_scores(metrics: &EngagementMetrics) -> String {
    format!(
        "{:.0} likes, {:.0} comments, trendy {:.2}, popular {:.2}",
        metrics.likes, metrics.comments, metrics.trendy_norm, metrics.popular_norm
    )
}

fn report_error(ctx: &AppContext) {
    if let Some(message) = ctx.content.last_error() {
        eprintln!("{}", message);
    }
}
