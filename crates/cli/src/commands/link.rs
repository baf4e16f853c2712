//! Normalize and domain commands

use anyhow::Result;
use links_category_domain::{domain_of, normalize as normalize_link};

use crate::args::LinkArgs;

pub fn normalize(args: LinkArgs) -> Result<()> {
    let url = match normalize_link(&args.link) {
        Ok(url) => url,
        Err(e) => anyhow::bail!("{} ({})", e, e.key()),
    };

    if args.json {
        let output = serde_json::json!({
            "input": args.link,
            "normalized": url.as_str(),
            "scheme": url.scheme(),
            "host": url.host(),
            "domain": domain_of(url.as_str()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", url);
    }

    Ok(())
}

pub fn domain(args: LinkArgs) -> Result<()> {
    let Some(domain) = domain_of(&args.link) else {
        anyhow::bail!("No domain in '{}'", args.link);
    };

    if args.json {
        let output = serde_json::json!({
            "input": args.link,
            "domain": domain,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", domain);
    }

    Ok(())
}
