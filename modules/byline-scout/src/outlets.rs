//! Source registry: the static outlet catalogue for each edition.
//!
//! Entries are `(name, base_url, region, feed_url)`. The catalogue is turned
//! into owned [`Outlet`] values once at startup and handed to the monitor.

use byline_common::{Edition, Outlet};

type CatalogueEntry = (&'static str, &'static str, &'static str, &'static str);

/// Build the outlet list for an edition, in catalogue order.
pub fn catalogue(edition: Edition) -> Vec<Outlet> {
    let entries = match edition {
        Edition::Canada => CANADA,
        Edition::UnitedKingdom => UNITED_KINGDOM,
    };
    entries
        .iter()
        .map(|(name, base_url, region, feed_url)| Outlet::new(name, base_url, region, feed_url))
        .collect()
}

// ---------------------------------------------------------------------------
// Canada
// ---------------------------------------------------------------------------

const CANADA: &[CatalogueEntry] = &[
    ("The Globe and Mail", "https://www.theglobeandmail.com/", "National", "https://www.theglobeandmail.com/arc/outboundfeeds/rss/?outputType=xml"),
    ("National Post", "https://nationalpost.com/", "National", "https://nationalpost.com/feed"),
    ("The Walrus", "https://thewalrus.ca/", "National", "https://thewalrus.ca/feed/"),
    ("BNN Bloomberg", "https://www.bnnbloomberg.ca/", "National", "https://www.bnnbloomberg.ca/rss/news/bnn-s-top-stories-1.1044434"),
    ("Canada's National Observer", "https://www.nationalobserver.com/", "National", "https://www.nationalobserver.com/front/rss"),
    ("Canadaland", "https://www.canadaland.com/", "National", "https://www.canadaland.com/feed/"),
    ("The Hill Times", "https://www.hilltimes.com/", "National (Ottawa)", "https://www.hilltimes.com/feed/"),
    ("The Vancouver Sun", "https://vancouversun.com/", "British Columbia", "https://vancouversun.com/feed"),
    ("The Tyee", "https://thetyee.ca/", "British Columbia", "https://thetyee.ca/rss2.xml"),
    ("Vancouver Is Awesome", "https://www.vancouverisawesome.com/", "British Columbia", "https://www.vancouverisawesome.com/rss"),
    ("Castanet (Most Recent)", "https://www.castanet.net/", "British Columbia", "https://www.castanet.net/rss/mostrecent.xml"),
    ("Castanet (Top Headlines)", "https://www.castanet.net/", "British Columbia", "https://www.castanet.net/rss/topheadlines.xml"),
    ("Calgary Herald", "https://calgaryherald.com/", "Alberta", "https://calgaryherald.com/feed"),
    ("Edmonton Journal", "https://edmontonjournal.com/", "Alberta", "https://edmontonjournal.com/feed"),
    ("Regina Leader-Post", "https://leaderpost.com/", "Saskatchewan", "https://leaderpost.com/feed"),
    ("Saskatoon StarPhoenix", "https://thestarphoenix.com/", "Saskatchewan", "https://thestarphoenix.com/feed"),
    ("Winnipeg Free Press", "https://www.winnipegfreepress.com/", "Manitoba", "https://www.winnipegfreepress.com/rss/?path=%2F"),
    ("Toronto Star", "https://www.thestar.com/", "Ontario", "https://www.thestar.com/feed/"),
    ("Ottawa Citizen", "https://ottawacitizen.com/", "Ontario", "https://ottawacitizen.com/feed"),
    ("The Hamilton Spectator", "https://www.thespec.com/", "Ontario", "https://www.thespec.com/rss/"),
    ("TVO (TVOntario)", "https://www.tvo.org/", "Ontario", "https://www.tvo.org/rss/articles/all"),
    ("Guelph Today", "https://www.guelphtoday.com/", "Ontario", "https://www.guelphtoday.com/rss"),
    ("La Presse", "https://www.lapresse.ca/", "Quebec", "https://www.lapresse.ca/actualites/rss"),
    ("Montreal Gazette", "https://montrealgazette.com/", "Quebec", "https://montrealgazette.com/feed"),
    ("SaltWire Network", "https://www.saltwire.com/", "Atlantic Canada", "https://www.saltwire.com/feed/"),
    ("Cabin Radio", "https://cabinradio.ca/", "Northwest Territories", "https://cabinradio.ca/feed/"),
    ("Nunatsiaq News", "https://nunatsiaq.com/", "Nunavut / Nunavik", "https://nunatsiaq.com/feed/"),
];

// ---------------------------------------------------------------------------
// United Kingdom
// ---------------------------------------------------------------------------

const UNITED_KINGDOM: &[CatalogueEntry] = &[
    ("BBC News", "https://www.bbc.co.uk/news", "UK", "http://feeds.bbci.co.uk/news/uk/rss.xml"),
    ("The Guardian", "https://www.theguardian.com/uk", "UK", "https://www.theguardian.com/uk/rss"),
    ("The Telegraph", "https://www.telegraph.co.uk/", "UK", "https://www.telegraph.co.uk/rss.xml"),
    ("Sky News", "https://news.sky.com/uk", "UK", "http://feeds.skynews.com/feeds/rss/uk.xml"),
    ("Financial Times", "https://www.ft.com/", "UK", "https://www.ft.com/rss/home-uk"),
    ("The Independent", "https://www.independent.co.uk/", "UK", "https://www.independent.co.uk/rss"),
    ("Daily Mail", "https://www.dailymail.co.uk/home/index.html", "UK", "https://www.dailymail.co.uk/news/index.rss"),
    ("The Sun", "https://www.thesun.co.uk/", "UK", "https://www.thesun.co.uk/feed/"),
    ("The Mirror", "https://www.mirror.co.uk/", "UK", "https://www.mirror.co.uk/?service=rss"),
    ("Daily Express", "https://www.express.co.uk/", "UK", "https://feeds.feedburner.com/daily-express-news"),
    ("Metro.co.uk", "https://metro.co.uk/", "UK", "https://metro.co.uk/feed/"),
    ("Evening Standard", "https://www.standard.co.uk/", "London", "https://www.standard.co.uk/rss"),
    ("HuffPost UK", "https://www.huffingtonpost.co.uk/", "UK", "https://www.huffingtonpost.co.uk/feeds/index.xml"),
    ("The New Statesman", "https://www.newstatesman.com/", "UK", "https://www.newstatesman.com/feed"),
    ("The Week UK", "https://www.theweek.com/uk", "UK", "https://www.theweek.com/uk/rss.xml"),
    ("Politics.co.uk", "https://www.politics.co.uk/", "UK", "https://www.politics.co.uk/feed/"),
    ("PinkNews", "https://www.thepinknews.com/", "UK", "https://www.thepinknews.com/feed/"),
    ("The Daily Mash", "https://www.thedailymash.co.uk/", "UK", "https://www.thedailymash.co.uk/feed"),
    ("Positive News", "https://www.positive.news/", "UK", "https://www.positive.news/feed/"),
    ("The Poke", "https://www.thepoke.co.uk/", "UK", "https://www.thepoke.co.uk/feed/"),
    ("Guido Fawkes", "https://order-order.com/", "UK", "https://feeds.feedburner.com/guidofawkes"),
    ("Manchester Evening News", "https://www.manchestereveningnews.co.uk/", "Manchester", "https://www.manchestereveningnews.co.uk/rss.xml"),
    ("Liverpool Echo", "https://www.liverpoolecho.co.uk/", "Liverpool", "https://www.liverpoolecho.co.uk/rss.xml"),
    ("Birmingham Mail", "https://www.birminghammail.co.uk/", "Birmingham", "https://www.birminghammail.co.uk/rss.xml"),
    ("WalesOnline", "https://www.walesonline.co.uk/", "Wales", "https://www.walesonline.co.uk/rss.xml"),
    ("The Scotsman", "https://www.scotsman.com/", "Scotland", "https://www.scotsman.com/rss"),
    ("The Herald (Scotland)", "https://www.heraldscotland.com/", "Scotland", "https://www.heraldscotland.com/news/rss"),
    ("Belfast Live", "https://www.belfastlive.co.uk/", "Northern Ireland", "https://www.belfastlive.co.uk/rss.xml"),
    ("Belfast Telegraph", "https://www.belfasttelegraph.co.uk/", "Northern Ireland", "https://www.belfasttelegraph.co.uk/rss/"),
    ("The Yorkshire Post", "https://www.yorkshirepost.co.uk/", "Yorkshire", "https://www.yorkshirepost.co.uk/rss"),
    ("The Argus (Brighton)", "https://www.theargus.co.uk/", "Brighton", "https://www.theargus.co.uk/news/rss/"),
    ("The York Press", "https://www.yorkpress.co.uk/", "York", "https://www.yorkpress.co.uk/news/rss/"),
    ("The Northern Echo", "https://www.thenorthernecho.co.uk/", "North England", "https://www.thenorthernecho.co.uk/news/rss/"),
    ("The Bolton News", "https://www.theboltonnews.co.uk/", "Bolton", "https://www.theboltonnews.co.uk/news/rss/"),
    ("The News (Portsmouth)", "https://www.portsmouth.co.uk/", "Portsmouth", "https://www.portsmouth.co.uk/rss"),
    ("Cambridgeshire Live", "https://www.cambridge-news.co.uk/", "Cambridge", "https://www.cambridge-news.co.uk/rss.xml"),
    ("Grimsby Telegraph", "https://www.grimsbytelegraph.co.uk/", "Grimsby", "https://www.grimsbytelegraph.co.uk/news/rss.xml"),
    ("Glasgow Times", "https://www.glasgowtimes.co.uk/", "Glasgow", "https://www.glasgowtimes.co.uk/news/rss/"),
    ("Deadline News (Scotland)", "https://www.deadlinenews.co.uk/", "Scotland", "https://www.deadlinenews.co.uk/feed/"),
    ("A Lady in London", "https://www.aladyinlondon.com/", "London", "https://www.aladyinlondon.com/feed"),
    ("The Londoner", "https://www.thelondoner.me/", "London", "https://www.thelondoner.me/feed"),
    ("UK Human Rights Blog", "https://ukhumanrightsblog.com/", "UK", "https://ukhumanrightsblog.com/feed/"),
    ("UK Constitutional Law Association", "https://ukconstitutionallaw.org/", "UK", "https://ukconstitutionallaw.org/blog/feed/"),
    ("In the frow", "https://www.inthefrow.com/", "UK", "https://inthefrow.com/feed"),
    ("A Luxury Travel Blog", "https://www.aluxurytravelblog.com/", "UK", "https://www.aluxurytravelblog.com/feed/"),
    ("Love My Dress", "https://www.lovemydress.net/", "UK", "https://www.lovemydress.net/feed/"),
    ("Age UK", "https://www.ageuk.org.uk/", "UK", "https://www.ageuk.org.uk/discover/rss/"),
    ("We Are Social UK", "https://wearesocial.com/uk/", "UK", "https://wearesocial.com/uk/feed/"),
    ("London Review of Books Blog", "https://www.lrb.co.uk/", "UK", "https://www.lrb.co.uk/blog/feed"),
    ("British Beauty Blogger", "https://britishbeautyblogger.com/", "UK", "https://britishbeautyblogger.com/feed/"),
    ("Rock n Roll Bride", "https://www.rocknrollbride.com/", "UK", "https://feeds2.feedburner.com/rocknrollbride"),
    ("Disneyrollergirl", "https://disneyrollergirl.net/", "UK", "https://disneyrollergirl.net/feed/"),
    ("SilverSpoon London", "https://silverspoonlondon.co.uk/", "London", "https://silverspoonlondon.co.uk/feed/"),
    ("UK Fundraising Blog", "https://fundraising.co.uk/", "UK", "https://fundraising.co.uk/category/blogs/feed/"),
    ("The Anna Edit", "https://www.theannaedit.com/", "UK", "https://www.theannaedit.com/feed/"),
    ("Healthy Magazine", "https://www.healthy-magazine.co.uk/", "UK", "https://www.healthy-magazine.co.uk/feed/"),
    ("Everything Zany", "https://everythingzany.com/", "UK", "https://everythingzany.com/feed/"),
    ("Lily Pebbles", "https://lilypebbles.co.uk/", "UK", "https://lilypebbles.co.uk/feed/"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn editions_have_expected_sizes() {
        assert_eq!(catalogue(Edition::Canada).len(), 27);
        assert_eq!(catalogue(Edition::UnitedKingdom).len(), 58);
    }

    #[test]
    fn catalogue_order_is_preserved() {
        let outlets = catalogue(Edition::Canada);
        assert_eq!(outlets[0].name, "The Globe and Mail");
        assert_eq!(outlets[0].domain(), "theglobeandmail.com");
        assert_eq!(outlets.last().map(|o| o.name.as_str()), Some("Nunatsiaq News"));
    }

    #[test]
    fn every_feed_is_http() {
        for edition in [Edition::Canada, Edition::UnitedKingdom] {
            for outlet in catalogue(edition) {
                assert!(
                    outlet.feed_url.starts_with("http://") || outlet.feed_url.starts_with("https://"),
                    "{} has a bad feed URL",
                    outlet.name
                );
                assert!(!outlet.domain().is_empty(), "{} has no domain", outlet.name);
            }
        }
    }

    #[test]
    fn outlet_names_are_unique_per_edition() {
        for edition in [Edition::Canada, Edition::UnitedKingdom] {
            let outlets = catalogue(edition);
            let names: HashSet<_> = outlets.iter().map(|o| o.name.as_str()).collect();
            assert_eq!(names.len(), outlets.len());
        }
    }

    #[test]
    fn section_urls_reduce_to_site_domain() {
        let uk = catalogue(Edition::UnitedKingdom);
        let guardian = uk.iter().find(|o| o.name == "The Guardian").unwrap();
        assert_eq!(guardian.domain(), "theguardian.com");
        let mail = uk.iter().find(|o| o.name == "Daily Mail").unwrap();
        assert_eq!(mail.domain(), "dailymail.co.uk");
    }
}
