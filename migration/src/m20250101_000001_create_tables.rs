use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Techniciens::Table)
                    .if_not_exists()
                    .col(uuid(Techniciens::Id).primary_key())
                    .col(string(Techniciens::Nom))
                    .col(string_null(Techniciens::Prenom))
                    .col(string_null(Techniciens::Email))
                    .col(string_null(Techniciens::Telephone))
                    .col(string(Techniciens::Mdp))
                    .col(string(Techniciens::Role).default("technicien"))
                    .col(json_null(Techniciens::Departements))
                    .col(double(Techniciens::PourcentageTech).default(50.0))
                    .col(boolean(Techniciens::EnLigne).default(false))
                    .col(boolean(Techniciens::EnPause).default(false))
                    .col(boolean(Techniciens::Actif).default(true))
                    .col(double_null(Techniciens::Latitude))
                    .col(double_null(Techniciens::Longitude))
                    .col(timestamp_with_time_zone_null(Techniciens::DerniereConnexion))
                    .col(timestamp_with_time_zone_null(Techniciens::DernierePosition))
                    .col(string_null(Techniciens::PushToken))
                    .col(timestamp_with_time_zone(Techniciens::CreatedAt))
                    .col(timestamp_with_time_zone(Techniciens::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_techniciens_nom")
                    .table(Techniciens::Table)
                    .col(Techniciens::Nom)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Interventions::Table)
                    .if_not_exists()
                    .col(uuid(Interventions::Id).primary_key())
                    .col(string(Interventions::Service))
                    .col(string(Interventions::Statut).default("En attente"))
                    .col(string_null(Interventions::Description))
                    .col(string_null(Interventions::ClientNom))
                    .col(string_null(Interventions::Adresse))
                    .col(string_null(Interventions::Cp))
                    .col(string_null(Interventions::Ville))
                    .col(string_null(Interventions::Telephone))
                    .col(double_null(Interventions::Prix))
                    .col(uuid_null(Interventions::TechId))
                    .col(string_null(Interventions::TechNom))
                    .col(string_null(Interventions::ModeDistribution))
                    .col(timestamp_with_time_zone_null(Interventions::DateAttribution))
                    .col(uuid_null(Interventions::LigneId))
                    .col(timestamp_with_time_zone(Interventions::CreatedAt))
                    .col(timestamp_with_time_zone(Interventions::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Devis::Table)
                    .if_not_exists()
                    .col(uuid(Devis::Id).primary_key())
                    .col(string(Devis::Numero))
                    .col(uuid_null(Devis::InterventionId))
                    .col(string(Devis::ClientNom))
                    .col(string_null(Devis::ClientPrenom))
                    .col(string_null(Devis::ClientEmail))
                    .col(string_null(Devis::ClientTel))
                    .col(string_null(Devis::ClientAdresse))
                    .col(string_null(Devis::ClientCp))
                    .col(string_null(Devis::ClientVille))
                    .col(json(Devis::Lignes))
                    .col(double(Devis::TotalHt).default(0.0))
                    .col(double(Devis::TotalTva).default(0.0))
                    .col(double(Devis::TotalTtc).default(0.0))
                    .col(string(Devis::Statut).default("brouillon"))
                    .col(timestamp_with_time_zone_null(Devis::DateValidite))
                    .col(text_null(Devis::SignatureData))
                    .col(string_null(Devis::SignePar))
                    .col(timestamp_with_time_zone_null(Devis::SigneLe))
                    .col(text_null(Devis::Notes))
                    .col(timestamp_with_time_zone(Devis::CreatedAt))
                    .col(timestamp_with_time_zone(Devis::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_devis_numero")
                    .table(Devis::Table)
                    .col(Devis::Numero)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Factures::Table)
                    .if_not_exists()
                    .col(uuid(Factures::Id).primary_key())
                    .col(uuid(Factures::DevisId))
                    .col(uuid_null(Factures::InterventionId))
                    .col(string(Factures::ClientNom))
                    .col(string_null(Factures::ClientPrenom))
                    .col(string_null(Factures::ClientEmail))
                    .col(string_null(Factures::ClientTel))
                    .col(string_null(Factures::ClientAdresse))
                    .col(string_null(Factures::ClientCp))
                    .col(string_null(Factures::ClientVille))
                    .col(json(Factures::Lignes))
                    .col(double(Factures::TotalHt).default(0.0))
                    .col(double(Factures::TotalTva).default(0.0))
                    .col(double(Factures::TotalTtc).default(0.0))
                    .col(string(Factures::Statut).default("impayee"))
                    .col(string_null(Factures::ModePaiement))
                    .col(string_null(Factures::ReferencePaiement))
                    .col(double_null(Factures::MontantPaye))
                    .col(timestamp_with_time_zone_null(Factures::PayeeLe))
                    .col(timestamp_with_time_zone(Factures::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One facture per devis: the unique index is what makes `facturer`
        // idempotent under concurrent retries.
        manager
            .create_index(
                Index::create()
                    .name("idx_factures_devis_id")
                    .table(Factures::Table)
                    .col(Factures::DevisId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EntrepriseConfig::Table)
                    .if_not_exists()
                    .col(uuid(EntrepriseConfig::Id).primary_key())
                    .col(string(EntrepriseConfig::Nom))
                    .col(string_null(EntrepriseConfig::Siret))
                    .col(string_null(EntrepriseConfig::Telephone))
                    .col(string_null(EntrepriseConfig::Email))
                    .col(string_null(EntrepriseConfig::Adresse))
                    .col(string_null(EntrepriseConfig::LogoUrl))
                    .col(text_null(EntrepriseConfig::ConditionsDevis))
                    .col(text_null(EntrepriseConfig::MentionLegale))
                    .col(timestamp_with_time_zone(EntrepriseConfig::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lignes::Table)
                    .if_not_exists()
                    .col(uuid(Lignes::Id).primary_key())
                    .col(string(Lignes::Nom))
                    .col(string_null(Lignes::Service))
                    .col(string_null(Lignes::Numero))
                    .col(timestamp_with_time_zone(Lignes::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DepensesPub::Table)
                    .if_not_exists()
                    .col(uuid(DepensesPub::Id).primary_key())
                    .col(uuid(DepensesPub::LigneId))
                    .col(double(DepensesPub::Montant))
                    .col(timestamp_with_time_zone(DepensesPub::Date))
                    .col(timestamp_with_time_zone(DepensesPub::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DepensesPub::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lignes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntrepriseConfig::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Factures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devis::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Interventions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Techniciens::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Techniciens {
    Table,
    Id,
    Nom,
    Prenom,
    Email,
    Telephone,
    Mdp,
    Role,
    Departements,
    PourcentageTech,
    EnLigne,
    EnPause,
    Actif,
    Latitude,
    Longitude,
    DerniereConnexion,
    DernierePosition,
    PushToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Interventions {
    Table,
    Id,
    Service,
    Statut,
    Description,
    ClientNom,
    Adresse,
    Cp,
    Ville,
    Telephone,
    Prix,
    TechId,
    TechNom,
    ModeDistribution,
    DateAttribution,
    LigneId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Devis {
    Table,
    Id,
    Numero,
    InterventionId,
    ClientNom,
    ClientPrenom,
    ClientEmail,
    ClientTel,
    ClientAdresse,
    ClientCp,
    ClientVille,
    Lignes,
    TotalHt,
    TotalTva,
    TotalTtc,
    Statut,
    DateValidite,
    SignatureData,
    SignePar,
    SigneLe,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Factures {
    Table,
    Id,
    DevisId,
    InterventionId,
    ClientNom,
    ClientPrenom,
    ClientEmail,
    ClientTel,
    ClientAdresse,
    ClientCp,
    ClientVille,
    Lignes,
    TotalHt,
    TotalTva,
    TotalTtc,
    Statut,
    ModePaiement,
    ReferencePaiement,
    MontantPaye,
    PayeeLe,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EntrepriseConfig {
    Table,
    Id,
    Nom,
    Siret,
    Telephone,
    Email,
    Adresse,
    LogoUrl,
    ConditionsDevis,
    MentionLegale,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lignes {
    Table,
    Id,
    Nom,
    Service,
    Numero,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DepensesPub {
    Table,
    Id,
    LigneId,
    Montant,
    Date,
    CreatedAt,
}
