//! Integration tests for the per-request site flow.

use std::sync::Arc;

use anyhow::{Result, bail, ensure};
use kotoba::dictionary::{DictionaryCache, DictionaryError, EmbeddedSource};
use kotoba::locale::LocaleRegistry;
use kotoba::{Page, RouteDecision, Site};
use rstest::rstest;
use test_support::{CountingSource, EN_FIXTURE, ES_FIXTURE};

fn site(source: EmbeddedSource) -> Site<Arc<CountingSource<EmbeddedSource>>> {
    Site::new(
        Arc::new(LocaleRegistry::builtin()),
        Arc::new(CountingSource::new(source)),
        Arc::new(DictionaryCache::new()),
    )
}

fn fixtures() -> EmbeddedSource {
    EmbeddedSource::new()
        .with_resource("en", EN_FIXTURE)
        .with_resource("es", ES_FIXTURE)
}

#[rstest]
#[case("/", "/en")]
#[case("/about?tab=1", "/en/about?tab=1")]
#[tokio::test]
async fn unprefixed_requests_redirect_without_loading(
    #[case] target: &str,
    #[case] expected: &str,
) -> Result<()> {
    let site = site(fixtures());
    let page = site.prepare(target).await?;
    let Page::Redirect(path) = page else {
        bail!("expected a redirect for {target}, got {page:?}");
    };
    ensure!(path == expected, "redirected to {path}");
    ensure!(site.loader().source().total() == 0, "redirects must not load dictionaries");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn prefixed_requests_render_with_their_dictionary() -> Result<()> {
    let site = site(fixtures());
    let page = site.prepare("/es/about").await?;
    let Page::Render { locale, translator } = page else {
        bail!("expected /es/about to render, got {page:?}");
    };
    ensure!(locale == "es", "rendered {locale}");
    ensure!(&*translator.t("home.welcome") == "Hola", "wrong dictionary");

    let again = site.prepare("/es").await?;
    let Page::Render { translator: second, .. } = again else {
        bail!("expected /es to render");
    };
    ensure!(
        second.dictionary().ptr_eq(translator.dictionary()),
        "pages should share the cached dictionary"
    );
    ensure!(site.loader().source().loads("es") == 1, "es loaded twice");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn missing_locale_resource_renders_default_content() -> Result<()> {
    let site = site(EmbeddedSource::new().with_resource("en", EN_FIXTURE));
    let page = site.prepare("/es/about").await?;
    let Page::Render { locale, translator } = page else {
        bail!("expected /es/about to render, got {page:?}");
    };
    ensure!(locale == "es", "the page locale comes from the path");
    ensure!(translator.dictionary().locale() == "en", "expected the default dictionary");
    ensure!(&*translator.t("home.welcome") == "Hi", "fallback content not served");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn missing_default_resource_is_an_error() -> Result<()> {
    let site = site(EmbeddedSource::new());
    let result = site.prepare("/en").await;
    ensure!(
        matches!(result, Err(DictionaryError::DefaultUnavailable { .. })),
        "expected a terminal failure, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn bypass_prefixes_keep_the_site_registry() -> Result<()> {
    let registry = Arc::new(LocaleRegistry::new(["en", "es"], "es")?);
    let site = Site::new(registry, fixtures(), Arc::new(DictionaryCache::new()))
        .with_bypass_prefixes(["/assets"]);

    ensure!(
        std::ptr::eq(site.router().registry(), site.loader().registry()),
        "router and loader must share one registry"
    );
    ensure!(site.router().intercept("/assets/app.css").is_none(), "prefix ignored");
    ensure!(
        site.router().intercept("/favicon.ico")
            == Some(RouteDecision::Redirect("/es/favicon.ico".to_owned())),
        "default prefixes should be replaced"
    );

    let page = site.prepare("/").await?;
    ensure!(
        matches!(&page, Page::Redirect(path) if path == "/es"),
        "expected redirect to /es, got {page:?}"
    );
    let rendered = site.prepare("/en").await?;
    let Page::Render { locale, translator } = rendered else {
        bail!("expected /en to render, got {rendered:?}");
    };
    ensure!(
        translator.dictionary().locale() == locale.as_str(),
        "served {} for {locale}",
        translator.dictionary().locale()
    );
    Ok(())
}
