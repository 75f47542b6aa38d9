pub mod admin_closure;
pub mod admin_job;
pub mod arxiu;
pub mod arxiu_llibre;
pub mod cognom;
pub mod entitat_eclesiastica;
pub mod event_historic;
pub mod grup;
pub mod grup_membre;
pub mod grup_politica;
pub mod llibre;
pub mod municipi;
pub mod nivell_administratiu;
pub mod nivell_demografia;
pub mod nivell_estadistica;
pub mod pais;
pub mod persona;
pub mod politica;
pub mod politica_grant;
pub mod usuari;
pub mod usuari_politica;
pub mod wiki_change;

pub use admin_closure::Entity as AdminClosure;
pub use admin_job::Entity as AdminJob;
pub use arxiu::Entity as Arxiu;
pub use arxiu_llibre::Entity as ArxiuLlibre;
pub use cognom::Entity as Cognom;
pub use entitat_eclesiastica::Entity as EntitatEclesiastica;
pub use event_historic::Entity as EventHistoric;
pub use grup::Entity as Grup;
pub use grup_membre::Entity as GrupMembre;
pub use grup_politica::Entity as GrupPolitica;
pub use llibre::Entity as Llibre;
pub use municipi::Entity as Municipi;
pub use nivell_administratiu::Entity as NivellAdministratiu;
pub use nivell_demografia::Entity as NivellDemografia;
pub use nivell_estadistica::Entity as NivellEstadistica;
pub use pais::Entity as Pais;
pub use persona::Entity as Persona;
pub use politica::Entity as Politica;
pub use politica_grant::Entity as PoliticaGrant;
pub use usuari::Entity as Usuari;
pub use usuari_politica::Entity as UsuariPolitica;
pub use wiki_change::Entity as WikiChange;
