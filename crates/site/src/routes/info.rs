use axum::{
    extract::State,
    http::Uri,
    response::Html,
};

use crate::{locale::RequestLocale, templates, SiteError, SiteState};

use super::{html, page_meta};

/// An informational page: fixed copy plus the collection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InfoPage {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub(crate) const INFO_PAGES: &[InfoPage] = &[
    InfoPage {
        slug: "collections",
        title: "Katalog Data",
        description: "Beberapa Katalog Data dalam portal ini telah disederhanakan agar mempermudah pencarian data maupun dataset.",
    },
    InfoPage {
        slug: "dashboard",
        title: "Kumpulan Dashboard Sekretariat Satu Data Indonesia",
        description: "Kumpulan Dashboard Sekretariat Satu Data Indonesia",
    },
    InfoPage {
        slug: "about",
        title: "Satu Data Indonesia",
        description: "Satu Data Indonesia (SDI) merupakan kebijakan tata kelola data pemerintah yang bertujuan untuk menciptakan data berkualitas, mudah diakses, dan dapat dibagipakaikan antar Instansi Pusat serta Daerah. Kebijakan ini tertuang dalam Peraturan Presiden no. 39 tahun 2019 tentang Satu Data Indonesia. Melalu SDI, seluruh data pemerintah dan data instansi lain yang terkait dapat bermuara di Portal Satu Data Indonesia (data.go.id). Portal Satu Data Indonesia merupakan portal resmi data terbuka Indonesia yang dikelola oleh Sekretariat Satu Data Indonesia tingkat Pusat, Kementerian Perencanaan Pembangunan Nasional / Bappenas. Melalui Portal Satu Data Indonesia, kami berupaya penuh untuk memperbaiki tata kelola data demi terwujudnya transparansi dan akuntabilitas pemerintah, serta mendukung pembangunan nasional.",
    },
    InfoPage {
        slug: "bimtek",
        title: "Bimbingan Teknis",
        description: "Bimbingan Teknis",
    },
    InfoPage {
        slug: "analisa",
        title: "Analisa Data",
        description: "Analisa Data",
    },
    InfoPage {
        slug: "ajudikasi",
        title: "Ajudikasi Data",
        description: "Ajudikasi Data",
    },
    InfoPage {
        slug: "permintaan",
        title: "Permintaan Data",
        description: "Permintaan Data",
    },
    InfoPage {
        slug: "komunitas",
        title: "Komunitas Ahli",
        description: "Komunitas Ahli",
    },
    InfoPage {
        slug: "kanal",
        title: "Kanal Luar",
        description: "Kanal Luar",
    },
    InfoPage {
        slug: "unduhan",
        title: "Unduhan Dokumen",
        description: "Unduhan Dokumen",
    },
    InfoPage {
        slug: "login",
        title: "Login",
        description: "Login",
    },
];

pub(crate) fn find(slug: &str) -> Option<&'static InfoPage> {
    INFO_PAGES.iter().find(|p| p.slug == slug)
}

/// Serves every entry of [`INFO_PAGES`]; the page is picked by path.
pub(crate) async fn render(
    State(state): State<SiteState>,
    RequestLocale(locale): RequestLocale,
    uri: Uri,
) -> Result<Html<Vec<u8>>, SiteError> {
    let page = find(uri.path().trim_matches('/')).ok_or_else(|| SiteError::not_found(uri.path()))?;
    let collections = state.dms.get_collections().await?;
    let meta = page_meta(&state, &locale, page.title).with_description(page.description);
    if page.slug == "collections" {
        html(|out| templates::collections_html(out, &meta, &collections))
    } else {
        html(|out| templates::info_html(out, &meta, page.slug, &collections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_info_page_is_distinct() {
        for page in INFO_PAGES {
            assert_eq!(find(page.slug), Some(page));
        }
        assert_eq!(find("organization"), None);
        assert_eq!(INFO_PAGES.len(), 11);
    }
}
